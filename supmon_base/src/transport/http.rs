//! HTTP transport over `reqwest`'s blocking client

use super::{
    check_endpoint, check_resolution, is_success, validate_endpoint, DeliveryMode, DeliveryResult,
    Transport,
};
use crate::api::MonitorError;
use crate::config::constants::delivery::{CONTENT_TYPE, MAX_RESPONSE_BODY, REQUEST_TIMEOUT};
use crate::logging::codes;
use crate::report::Report;
use crate::{log_error, log_success, log_warning};
use reqwest::blocking::Client;
use reqwest::header;
use reqwest::Url;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const FLUSH_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    allow_loopback: bool,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl HttpTransport {
    pub fn new(allow_loopback: bool) -> Result<Self, MonitorError> {
        Self::with_timeout(allow_loopback, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(allow_loopback: bool, timeout: Duration) -> Result<Self, MonitorError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            log_error!(codes::delivery::CLIENT_BUILD_FAILED, "Cannot build HTTP client",
                "error" => e
            );
            MonitorError::Configuration {
                reason: format!("Cannot build HTTP client: {}", e),
            }
        })?;

        Ok(Self {
            client,
            allow_loopback,
            workers: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn allows_loopback(&self) -> bool {
        self.allow_loopback
    }

    /// Background deliveries not yet finished
    pub fn pending(&self) -> usize {
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        reap(&mut workers);
        workers.len()
    }

    fn track(&self, worker: JoinHandle<()>) {
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        reap(&mut workers);
        workers.push(worker);
    }
}

/// Join finished workers and keep the rest
fn reap(workers: &mut Vec<JoinHandle<()>>) {
    let (done, running): (Vec<_>, Vec<_>) = workers.drain(..).partition(|w| w.is_finished());
    for worker in done {
        let _ = worker.join();
    }
    *workers = running;
}

impl Transport for HttpTransport {
    fn deliver(
        &self,
        endpoint: &str,
        report: &Report,
        mode: DeliveryMode,
    ) -> Result<DeliveryResult, MonitorError> {
        let refuse = |e: MonitorError| {
            log_error!(e.code(), "Refusing to deliver report", "endpoint" => endpoint, "error" => &e);
            e
        };
        // Fire-and-forget defers the resolver lookup to its worker
        let url = match mode {
            DeliveryMode::Blocking => validate_endpoint(endpoint, self.allow_loopback),
            DeliveryMode::FireAndForget => check_endpoint(endpoint, self.allow_loopback),
        }
        .map_err(refuse)?;
        let body = report.to_json_compact()?;

        match mode {
            DeliveryMode::Blocking => {
                let (status, text) = post(&self.client, url, body)?;
                if is_success(status) {
                    log_success!(codes::success::REPORT_DELIVERED, "Report delivered",
                        "endpoint" => endpoint,
                        "status" => status
                    );
                    Ok(DeliveryResult::Delivered { status, body: text })
                } else {
                    log_error!(codes::delivery::DELIVERY_FAILED, "Endpoint rejected report",
                        "endpoint" => endpoint,
                        "status" => status
                    );
                    Err(MonitorError::DeliveryFailed { status, body: text })
                }
            }
            DeliveryMode::FireAndForget => {
                let client = self.client.clone();
                let allow_loopback = self.allow_loopback;
                let target = endpoint.to_string();

                let worker = std::thread::Builder::new()
                    .name("supmon-deliver".to_string())
                    .spawn(move || {
                        if let Err(e) = check_resolution(&url, allow_loopback) {
                            log_warning!(code = e.code(), "Background delivery refused",
                                "endpoint" => &target,
                                "error" => &e
                            );
                            return;
                        }
                        match post(&client, url, body) {
                            Ok((status, _)) if is_success(status) => {
                                log_success!(codes::success::REPORT_DELIVERED,
                                    "Background delivery completed",
                                    "endpoint" => &target,
                                    "status" => status
                                );
                            }
                            Ok((status, _)) => {
                                log_warning!(code = codes::delivery::DELIVERY_FAILED,
                                    "Background delivery rejected",
                                    "endpoint" => &target,
                                    "status" => status
                                );
                            }
                            Err(e) => {
                                log_warning!(code = codes::delivery::REQUEST_FAILED,
                                    "Background delivery failed",
                                    "endpoint" => &target,
                                    "error" => e
                                );
                            }
                        }
                    })
                    .map_err(|e| MonitorError::RequestFailed {
                        reason: format!("Cannot spawn delivery worker: {}", e),
                    })?;
                self.track(worker);

                log_success!(codes::success::REPORT_DISPATCHED, "Report dispatched",
                    "endpoint" => endpoint
                );
                Ok(DeliveryResult::Dispatched)
            }
        }
    }

    fn flush(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            let pending = self.pending();
            if pending == 0 {
                return 0;
            }
            if Instant::now() >= deadline {
                log_warning!(code = codes::delivery::REQUEST_FAILED,
                    "Background deliveries still running at shutdown",
                    "pending" => pending
                );
                return pending;
            }
            std::thread::sleep(FLUSH_POLL);
        }
    }
}

fn post(client: &Client, url: Url, body: String) -> Result<(u16, String), MonitorError> {
    let response = client
        .post(url)
        .header(header::CONTENT_TYPE, CONTENT_TYPE)
        .body(body)
        .send()
        .map_err(|e| {
            log_error!(codes::delivery::REQUEST_FAILED, "Request failed", "error" => &e);
            MonitorError::RequestFailed {
                reason: e.to_string(),
            }
        })?;

    let status = response.status().as_u16();
    let text = response.text().unwrap_or_default();
    Ok((status, truncate(text, MAX_RESPONSE_BODY)))
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}
