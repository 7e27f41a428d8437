/// Fixed operating constants for the reporting pipeline
pub mod scheduling {
    use std::time::Duration;

    /// Name of the periodic event in the schedule registry
    pub const EVENT_NAME: &str = "supmon_report";

    /// Periodic trigger interval (twice daily)
    pub const REPORT_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

    /// Age after which the last run is considered stale and a catch-up fires
    pub const CATCH_UP_THRESHOLD: Duration = Duration::from_secs(12 * 60 * 60);

    /// Poll period of the daemon loop between due checks
    pub const DAEMON_POLL_INTERVAL: Duration = Duration::from_secs(60);
}

pub mod delivery {
    use std::time::Duration;

    /// Fixed request timeout for report delivery
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Longest wait at exit for fire-and-forget deliveries still in flight
    pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(35);

    pub const CONTENT_TYPE: &str = "application/json";

    /// Upper bound on response body bytes kept for diagnostics
    pub const MAX_RESPONSE_BODY: usize = 64 * 1024;
}

pub mod state {
    /// Fixed key of the last-run record in the key-value store
    pub const LAST_RUN_KEY: &str = "supmon_last_run";

    /// File name of the schedule registry inside the state directory
    pub const SCHEDULE_FILE: &str = "supmon_schedule.json";
}
