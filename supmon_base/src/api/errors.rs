//! # Monitor Errors

use crate::config::ConfigError;
use crate::logging::{codes, Code};

/// Error type for every fallible monitor operation
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Endpoint is malformed or points at a disallowed internal host
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Compilation produced an empty report
    #[error("No data to report: inventory is empty")]
    NoData,

    /// Blocking delivery answered outside [200,300)
    #[error("Delivery failed with HTTP {status}")]
    DeliveryFailed { status: u16, body: String },

    /// Request never produced an HTTP response (DNS, connect, timeout, TLS)
    #[error("Request failed: {reason}")]
    RequestFailed { reason: String },

    /// Periodic event registration failed
    #[error("Scheduling failed: {reason}")]
    SchedulingFailed { reason: String },

    /// Report or state could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key-value store read/write failed
    #[error("Storage error at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Another trigger is already posting a report
    #[error("A report run is already in progress")]
    AlreadyRunning,
}

impl From<ConfigError> for MonitorError {
    fn from(err: ConfigError) -> Self {
        MonitorError::Configuration {
            reason: err.to_string(),
        }
    }
}

impl MonitorError {
    /// Whether the next trigger may succeed without operator action
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MonitorError::DeliveryFailed { .. }
                | MonitorError::RequestFailed { .. }
                | MonitorError::AlreadyRunning
                | MonitorError::Storage { .. }
        )
    }

    /// Logging code for this error
    pub fn code(&self) -> Code {
        match self {
            MonitorError::InvalidEndpoint { .. } => codes::delivery::INVALID_ENDPOINT,
            MonitorError::NoData => codes::compilation::NO_DATA,
            MonitorError::DeliveryFailed { .. } => codes::delivery::DELIVERY_FAILED,
            MonitorError::RequestFailed { .. } => codes::delivery::REQUEST_FAILED,
            MonitorError::SchedulingFailed { .. } => codes::scheduling::REGISTRATION_FAILED,
            MonitorError::Serialization(_) => codes::compilation::SERIALIZATION_FAILED,
            MonitorError::Storage { .. } => codes::state::STORE_WRITE_FAILED,
            MonitorError::Configuration { .. } => codes::system::CONFIGURATION_ERROR,
            MonitorError::AlreadyRunning => codes::scheduling::RUN_IN_PROGRESS,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            MonitorError::InvalidEndpoint { endpoint, reason } => {
                format!("Invalid request URL {}: {}", endpoint, reason)
            }
            MonitorError::NoData => "No data to post!".to_string(),
            MonitorError::DeliveryFailed { status, body } if body.is_empty() => {
                format!("Unable to post! Endpoint answered HTTP {}", status)
            }
            MonitorError::DeliveryFailed { status, body } => {
                format!("Unable to post! Endpoint answered HTTP {}: {}", status, body)
            }
            MonitorError::RequestFailed { reason } => format!("Unable to post! {}", reason),
            MonitorError::SchedulingFailed { reason } => {
                format!("There was an error scheduling the event: {}", reason)
            }
            MonitorError::Serialization(e) => format!("Could not encode report: {}", e),
            MonitorError::Storage { path, source } => {
                format!("Could not access {}: {}", path, source)
            }
            MonitorError::Configuration { reason } => reason.clone(),
            MonitorError::AlreadyRunning => "A report is already being posted".to_string(),
        }
    }
}
