//! Periodic trigger registration and the catch-up decision

pub mod registry;

pub use registry::{MemoryScheduleRegistry, RegistryError, ScheduleRegistry};

use crate::api::MonitorError;
use crate::config::constants::scheduling::{CATCH_UP_THRESHOLD, EVENT_NAME, REPORT_INTERVAL};
use crate::logging::codes;
use crate::state::RunState;
use crate::{log_debug, log_error, log_success};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Whether the last run is missing, unreadable or older than `threshold`
pub fn needs_catch_up(state: Option<&RunState>, now: DateTime<Utc>, threshold: Duration) -> bool {
    match state.and_then(RunState::attempted_at) {
        Some(last) => now - last > threshold,
        None => true,
    }
}

pub struct Scheduler {
    registry: Arc<dyn ScheduleRegistry>,
    event: String,
    interval: Duration,
    catch_up_threshold: Duration,
}

impl Scheduler {
    pub fn new(registry: Arc<dyn ScheduleRegistry>) -> Self {
        Self {
            registry,
            event: EVENT_NAME.to_string(),
            interval: Duration::seconds(REPORT_INTERVAL.as_secs() as i64),
            catch_up_threshold: Duration::seconds(CATCH_UP_THRESHOLD.as_secs() as i64),
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register the periodic event unless already registered
    ///
    /// Returns `true` when a registration was made.
    pub fn schedule(&self, now: DateTime<Utc>) -> Result<bool, MonitorError> {
        if self.next_scheduled()?.is_some() {
            log_debug!("Event already scheduled", "event" => &self.event);
            return Ok(false);
        }

        let first = now + self.interval;
        self.registry
            .set_next_run(&self.event, first)
            .map_err(|e| self.failed("schedule", e))?;

        log_success!(codes::success::EVENT_SCHEDULED, "Periodic report scheduled",
            "event" => &self.event,
            "next_run" => first.to_rfc3339()
        );
        Ok(true)
    }

    /// Remove the periodic event if registered
    ///
    /// Returns `true` when a registration was removed.
    pub fn unschedule(&self) -> Result<bool, MonitorError> {
        if self.next_scheduled()?.is_none() {
            return Ok(false);
        }

        self.registry
            .remove(&self.event)
            .map_err(|e| self.failed("unschedule", e))?;

        log_success!(codes::success::EVENT_UNSCHEDULED, "Periodic report unscheduled",
            "event" => &self.event
        );
        Ok(true)
    }

    pub fn next_scheduled(&self) -> Result<Option<DateTime<Utc>>, MonitorError> {
        self.registry
            .next_run(&self.event)
            .map_err(|e| self.failed("read", e))
    }

    pub fn needs_catch_up(&self, state: Option<&RunState>, now: DateTime<Utc>) -> bool {
        needs_catch_up(state, now, self.catch_up_threshold)
    }

    /// Whether the registered event's next run has arrived
    pub fn due(&self, now: DateTime<Utc>) -> Result<bool, MonitorError> {
        Ok(self.next_scheduled()?.map(|next| next <= now).unwrap_or(false))
    }

    /// Move the next run one interval on; missed slots are skipped
    pub fn advance(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, MonitorError> {
        let mut next = self.next_scheduled()?.unwrap_or(now) + self.interval;
        if next <= now {
            next = now + self.interval;
        }

        self.registry
            .set_next_run(&self.event, next)
            .map_err(|e| self.failed("advance", e))?;

        log_debug!("Next run advanced", "event" => &self.event, "next_run" => next.to_rfc3339());
        Ok(next)
    }

    fn failed(&self, action: &str, error: RegistryError) -> MonitorError {
        log_error!(codes::scheduling::REGISTRATION_FAILED, "Schedule registry call failed",
            "event" => &self.event,
            "action" => action,
            "error" => &error
        );
        MonitorError::SchedulingFailed {
            reason: format!("{} {}: {}", action, self.event, error),
        }
    }
}
