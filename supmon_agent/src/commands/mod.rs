//! Command handlers
//!
//! Each handler drives one [`Monitor`] operation and returns the text to print.

pub mod output;

pub use output::{OutputFormat, OutputOptions};

use std::time::Duration;
use supmon_base::api::{Monitor, MonitorError};
use supmon_base::config::constants::delivery::SHUTDOWN_GRACE;
use supmon_base::logging::codes;
use supmon_base::transport::DeliveryMode;
use supmon_base::{log_error, log_info, log_warning};

/// Post one report and wait for the endpoint's answer
pub fn update(monitor: &Monitor, options: &OutputOptions) -> Result<String, MonitorError> {
    let outcome = monitor.post(DeliveryMode::Blocking)?;
    Ok(output::render_post(&outcome, options)?)
}

pub fn info(monitor: &Monitor, options: &OutputOptions) -> Result<String, MonitorError> {
    let info = monitor.info()?;
    Ok(output::render_info(&info, options)?)
}

/// Compile and print a report without sending it
pub fn report(monitor: &Monitor, options: &OutputOptions) -> Result<String, MonitorError> {
    let report = monitor.compile_report()?;
    Ok(output::render_report(&report, options)?)
}

pub fn schedule(monitor: &Monitor) -> Result<String, MonitorError> {
    Ok(if monitor.schedule()? {
        "Event successfully scheduled".to_string()
    } else {
        "Event already scheduled".to_string()
    })
}

pub fn unschedule(monitor: &Monitor) -> Result<String, MonitorError> {
    Ok(if monitor.unschedule()? {
        "Event successfully unscheduled".to_string()
    } else {
        "Event was not scheduled".to_string()
    })
}

/// Unschedule and delete the last-run record
pub fn uninstall(monitor: &Monitor) -> Result<String, MonitorError> {
    monitor.teardown()?;
    Ok("Support monitor removed".to_string())
}

/// Daemon loop: catch-up first, then post whenever the periodic event is due
///
/// With `once`, performs a single due check and returns once any catch-up
/// delivery has finished.
pub fn run(monitor: &Monitor, once: bool, poll: Duration) -> Result<String, MonitorError> {
    if monitor.api_endpoint().is_none() {
        return Err(MonitorError::Configuration {
            reason: "API endpoint is not configured; scheduling is inactive".to_string(),
        });
    }

    monitor.schedule()?;

    if let Err(e) = monitor.evaluate_catch_up() {
        log_warning!(code = e.code(), "Catch-up post failed", "error" => &e);
    }

    let mut posts = 0usize;
    loop {
        match monitor.run_due() {
            Ok(Some(outcome)) => {
                posts += 1;
                log_info!("Periodic report posted", "outcome" => outcome.state.outcome.as_str());
            }
            Ok(None) => {}
            // Failure is already recorded; wait for the next interval
            Err(e) if e.is_recoverable() => {
                log_warning!(code = e.code(), "Periodic report failed", "error" => &e);
            }
            Err(e) => {
                log_error!(codes::system::INTERNAL_ERROR, "Periodic report failed", "error" => &e);
                if once {
                    monitor.flush(SHUTDOWN_GRACE);
                    return Err(e);
                }
            }
        }

        if once {
            break;
        }
        std::thread::sleep(poll);
    }

    monitor.flush(SHUTDOWN_GRACE);

    Ok(format!("Daemon finished after {} periodic post(s)", posts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use supmon_base::api::MonitorDeps;
    use supmon_base::config::MonitorConfig;
    use supmon_base::inventory::{AddonMetadata, StaticHost};
    use supmon_base::report::Report;
    use supmon_base::scheduler::MemoryScheduleRegistry;
    use supmon_base::state::MemoryStore;
    use supmon_base::transport::{DeliveryResult, Transport};

    struct AcceptAll;

    impl Transport for AcceptAll {
        fn deliver(
            &self,
            _endpoint: &str,
            _report: &Report,
            mode: DeliveryMode,
        ) -> Result<DeliveryResult, MonitorError> {
            Ok(match mode {
                DeliveryMode::Blocking => DeliveryResult::Delivered {
                    status: 200,
                    body: "thanks".to_string(),
                },
                DeliveryMode::FireAndForget => DeliveryResult::Dispatched,
            })
        }
    }

    fn monitor(endpoint: Option<&str>) -> Monitor {
        let config = MonitorConfig {
            api_endpoint: endpoint.map(str::to_string),
            api_secret: Some("secret".to_string()),
            site_url: Some("https://site.example.com".to_string()),
            ..Default::default()
        };
        let host = StaticHost::new()
            .with_core("6.4.2")
            .with_plugin("akismet/akismet.php", AddonMetadata::new("Akismet", "5.3"));

        Monitor::configure(
            &config,
            MonitorDeps::new(
                Arc::new(host),
                Arc::new(AcceptAll),
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryScheduleRegistry::new()),
            ),
        )
    }

    #[test]
    fn test_update_prints_status() {
        let monitor = monitor(Some("https://collector.example.com"));
        let out = update(&monitor, &OutputOptions::default()).unwrap();
        assert!(out.contains("success"));
        assert!(out.contains("200"));
        assert!(out.contains("thanks"));
    }

    #[test]
    fn test_schedule_messages() {
        let monitor = monitor(Some("https://collector.example.com"));
        assert_eq!(schedule(&monitor).unwrap(), "Event successfully scheduled");
        assert_eq!(schedule(&monitor).unwrap(), "Event already scheduled");
        assert_eq!(unschedule(&monitor).unwrap(), "Event successfully unscheduled");
        assert_eq!(unschedule(&monitor).unwrap(), "Event was not scheduled");
    }

    #[test]
    fn test_report_works_without_endpoint() {
        let monitor = monitor(None);
        let out = report(&monitor, &OutputOptions::new(OutputFormat::Json, false)).unwrap();
        assert!(out.contains("\"identity\":\"https://site.example.com\""));
    }

    #[test]
    fn test_run_requires_endpoint() {
        let monitor = monitor(None);
        assert!(matches!(
            run(&monitor, true, Duration::from_millis(1)),
            Err(MonitorError::Configuration { .. })
        ));
    }

    #[test]
    fn test_run_once_schedules_and_catches_up() {
        let monitor = monitor(Some("https://collector.example.com"));
        run(&monitor, true, Duration::from_millis(1)).unwrap();

        assert!(monitor.scheduler().next_scheduled().unwrap().is_some());
        assert!(monitor.last_run().is_some());
    }

    #[test]
    fn test_run_once_waits_for_catch_up_delivery() {
        use std::io::Read;
        use supmon_base::transport::HttpTransport;
        use tiny_http::{Response, Server};

        let Ok(server) = Server::http("127.0.0.1:0") else { return };
        let Some(port) = server.server_addr().to_ip().map(|addr| addr.port()) else { return };
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            if let Ok(mut request) = server.recv() {
                // Answer slowly so the delivery outlives the catch-up call
                std::thread::sleep(Duration::from_millis(300));
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let _ = tx.send(body);
                let _ = request.respond(Response::from_string("ok"));
            }
        });

        let config = MonitorConfig {
            api_endpoint: Some(format!("http://127.0.0.1:{}/report", port)),
            api_secret: Some("secret".to_string()),
            site_url: Some("https://site.example.com".to_string()),
            allow_loopback: true,
            ..Default::default()
        };
        let monitor = Monitor::configure(
            &config,
            MonitorDeps::new(
                Arc::new(StaticHost::new().with_core("6.4.2")),
                Arc::new(HttpTransport::new(true).unwrap()),
                Arc::new(MemoryStore::new()),
                Arc::new(MemoryScheduleRegistry::new()),
            ),
        );

        run(&monitor, true, Duration::from_millis(1)).unwrap();

        let body = rx.try_recv().expect("catch-up report reached the endpoint");
        assert!(body.contains("\"identity\":\"https://site.example.com\""));
    }

    #[test]
    fn test_uninstall_clears_everything() {
        let monitor = monitor(Some("https://collector.example.com"));
        update(&monitor, &OutputOptions::default()).unwrap();
        schedule(&monitor).unwrap();

        uninstall(&monitor).unwrap();
        assert!(monitor.last_run().is_none());
        assert!(monitor.scheduler().next_scheduled().unwrap().is_none());
    }
}
