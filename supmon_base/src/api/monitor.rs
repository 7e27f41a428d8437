//! # Monitor Service
//!
//! Wires collection, delivery, persistence and scheduling behind one
//! dependency-injected object. Construct once at startup and pass by
//! reference; construction performs no I/O.

use super::errors::MonitorError;
use crate::config::MonitorConfig;
use crate::inventory::HostEnvironment;
use crate::logging::codes;
use crate::report::{Clock, Report, ReportCompiler, SystemClock};
use crate::scheduler::{ScheduleRegistry, Scheduler};
use crate::state::{RunState, RunStateStore};
use crate::transport::{DeliveryMode, DeliveryResult, Transport};
use crate::{log_error, log_info, log_success, log_warning};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Collaborators the monitor is built from
pub struct MonitorDeps {
    pub host: Arc<dyn HostEnvironment>,
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn RunStateStore>,
    pub registry: Arc<dyn ScheduleRegistry>,
    pub clock: Arc<dyn Clock>,
}

impl MonitorDeps {
    pub fn new(
        host: Arc<dyn HostEnvironment>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn RunStateStore>,
        registry: Arc<dyn ScheduleRegistry>,
    ) -> Self {
        Self {
            host,
            transport,
            store,
            registry,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Result of a completed post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOutcome {
    pub delivery: DeliveryResult,
    pub state: RunState,
    /// Whether the run state reached the store
    pub persisted: bool,
}

/// Snapshot for the `info` command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorInfo {
    pub api_endpoint: Option<String>,
    pub api_secret: String,
    pub identity: String,
    pub last_run: Option<String>,
    pub last_outcome: Option<String>,
    pub next_scheduled: Option<DateTime<Utc>>,
}

/// Clears the run flag when a post finishes, however it finishes
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Monitor {
    api_endpoint: Option<String>,
    api_secret: String,
    identity: String,
    compiler: ReportCompiler,
    transport: Arc<dyn Transport>,
    store: Arc<dyn RunStateStore>,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,
    running: AtomicBool,
}

impl Monitor {
    /// Build the monitor from resolved configuration; no side effects
    pub fn configure(config: &MonitorConfig, deps: MonitorDeps) -> Self {
        Self {
            api_endpoint: config.api_endpoint(),
            api_secret: config.api_secret(),
            identity: config.site_url(),
            compiler: ReportCompiler::with_clock(deps.host, deps.clock.clone()),
            transport: deps.transport,
            store: deps.store,
            scheduler: Scheduler::new(deps.registry),
            clock: deps.clock,
            running: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn api_endpoint(&self) -> Option<&str> {
        self.api_endpoint.as_deref()
    }

    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Last recorded run; store faults read as no record
    pub fn last_run(&self) -> Option<RunState> {
        match self.store.load() {
            Ok(state) => state,
            Err(e) => {
                log_warning!(code = codes::state::STORE_READ_FAILED,
                    "Cannot read last-run record",
                    "error" => e
                );
                None
            }
        }
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Compile a report without delivering it
    pub fn compile_report(&self) -> Result<Report, MonitorError> {
        self.compiler.compile(&self.api_secret, &self.identity)
    }

    /// Fire one non-blocking post when the last run is missing or stale
    ///
    /// Returns `None` when no catch-up was needed or possible.
    pub fn evaluate_catch_up(&self) -> Result<Option<PostOutcome>, MonitorError> {
        if self.api_endpoint.is_none() {
            log_info!("No endpoint configured, skipping catch-up");
            return Ok(None);
        }

        let last_run = self.last_run();
        if !self
            .scheduler
            .needs_catch_up(last_run.as_ref(), self.clock.now())
        {
            return Ok(None);
        }

        log_info!("Last run missing or stale, posting catch-up report",
            "last_run" => last_run.as_ref().map(|s| s.timestamp.as_str()).unwrap_or("never")
        );

        match self.post(DeliveryMode::FireAndForget) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(MonitorError::AlreadyRunning) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Compile, deliver and record one report
    pub fn post(&self, mode: DeliveryMode) -> Result<PostOutcome, MonitorError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            log_info!("Report run already in progress, skipping trigger", "mode" => mode);
            return Err(MonitorError::AlreadyRunning);
        };

        let endpoint = self.require_endpoint()?;
        let report = self.compile_report()?;

        match self.transport.deliver(endpoint, &report, mode) {
            Ok(delivery) => {
                let now = self.clock.now();
                let state = match &delivery {
                    DeliveryResult::Delivered { status, body } => {
                        RunState::delivered(report, *status, body.clone(), now)
                    }
                    DeliveryResult::Dispatched => RunState::dispatched(report, now),
                };
                let persisted = self.record(&state);
                Ok(PostOutcome {
                    delivery,
                    state,
                    persisted,
                })
            }
            Err(MonitorError::DeliveryFailed { status, body }) => {
                let state =
                    RunState::failed(report, Some(status), Some(body.clone()), self.clock.now());
                self.record(&state);
                Err(MonitorError::DeliveryFailed { status, body })
            }
            Err(MonitorError::RequestFailed { reason }) => {
                let state = RunState::failed(report, None, Some(reason.clone()), self.clock.now());
                self.record(&state);
                Err(MonitorError::RequestFailed { reason })
            }
            Err(e) => Err(e),
        }
    }

    /// Register the periodic event; requires an endpoint
    pub fn schedule(&self) -> Result<bool, MonitorError> {
        self.require_endpoint()?;
        self.scheduler.schedule(self.clock.now())
    }

    pub fn unschedule(&self) -> Result<bool, MonitorError> {
        self.scheduler.unschedule()
    }

    /// Post if the periodic event is due, then move it on one interval
    pub fn run_due(&self) -> Result<Option<PostOutcome>, MonitorError> {
        let now = self.clock.now();
        if !self.scheduler.due(now)? {
            return Ok(None);
        }

        self.scheduler.advance(now)?;
        self.post(DeliveryMode::Blocking).map(Some)
    }

    pub fn info(&self) -> Result<MonitorInfo, MonitorError> {
        let last_run = self.last_run();
        Ok(MonitorInfo {
            api_endpoint: self.api_endpoint.clone(),
            api_secret: self.api_secret.clone(),
            identity: self.identity.clone(),
            last_outcome: last_run.as_ref().map(|s| s.outcome.as_str().to_string()),
            last_run: last_run.map(|s| s.timestamp),
            next_scheduled: self.scheduler.next_scheduled()?,
        })
    }

    /// Wait for background deliveries before the process exits
    ///
    /// Returns how many were still running after `timeout`.
    pub fn flush(&self, timeout: std::time::Duration) -> usize {
        self.transport.flush(timeout)
    }

    /// Unschedule and delete the last-run record
    pub fn teardown(&self) -> Result<(), MonitorError> {
        self.scheduler.unschedule()?;
        self.store.clear()?;
        log_success!(codes::success::RUN_STATE_CLEARED, "Monitor state removed");
        Ok(())
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn require_endpoint(&self) -> Result<&str, MonitorError> {
        self.api_endpoint.as_deref().ok_or_else(|| {
            log_error!(codes::system::CONFIGURATION_ERROR, "No API endpoint configured");
            MonitorError::Configuration {
                reason: "API endpoint is not configured".to_string(),
            }
        })
    }

    fn record(&self, state: &RunState) -> bool {
        match self.store.save(state) {
            Ok(()) => {
                log_success!(codes::success::RUN_STATE_SAVED, "Last run recorded",
                    "outcome" => state.outcome.as_str(),
                    "timestamp" => &state.timestamp
                );
                true
            }
            Err(e) => {
                log_error!(codes::state::STORE_WRITE_FAILED, "Cannot record last run",
                    "error" => e
                );
                false
            }
        }
    }
}
