//! Runtime preferences for the logging subsystem

use crate::config::runtime::LoggingPreferences;
use crate::logging::events::LogLevel;
use std::sync::OnceLock;

static RUNTIME_PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

/// Initialize runtime preferences; must happen before `init_global_logging`
pub fn init_runtime_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    RUNTIME_PREFERENCES
        .set(preferences)
        .map_err(|_| "Runtime preferences already initialized".to_string())
}

/// Get runtime preferences (with fallback to environment defaults)
fn get_runtime_preferences() -> LoggingPreferences {
    RUNTIME_PREFERENCES.get().cloned().unwrap_or_default()
}

/// Get minimum log level
pub fn get_min_log_level() -> LogLevel {
    get_runtime_preferences().min_log_level
}

/// Check if structured logging is enabled
pub fn use_structured_logging() -> bool {
    get_runtime_preferences().use_structured_logging
}

/// Check if events should be forwarded to the `log` facade
pub fn use_log_facade() -> bool {
    get_runtime_preferences().forward_to_log_facade
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_fall_back_to_defaults() {
        let defaults = LoggingPreferences::default();
        assert_eq!(get_min_log_level(), defaults.min_log_level);
        assert_eq!(use_structured_logging(), defaults.use_structured_logging);
    }
}
