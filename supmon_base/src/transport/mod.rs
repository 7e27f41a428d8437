//! Report delivery
//!
//! [`Transport`] is the seam between the pipeline and the network.
//! [`HttpTransport`] posts the report as JSON; tests and embedders may plug in
//! their own implementation.

pub mod endpoint;
pub mod http;

pub use endpoint::{check_endpoint, check_resolution, is_internal, validate_endpoint};
pub use http::HttpTransport;

use crate::api::MonitorError;
use crate::report::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How long the caller waits for the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Wait for the response and report its status
    Blocking,
    /// Send on a background worker and return immediately
    FireAndForget,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Blocking => f.write_str("blocking"),
            DeliveryMode::FireAndForget => f.write_str("fire_and_forget"),
        }
    }
}

/// Successful delivery result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// Endpoint answered with a 2xx status
    Delivered { status: u16, body: String },
    /// Request handed to a background worker; outcome unknown
    Dispatched,
}

pub trait Transport: Send + Sync {
    /// POST `report` to `endpoint`
    ///
    /// Blocking mode maps non-2xx answers to [`MonitorError::DeliveryFailed`]
    /// and network faults to [`MonitorError::RequestFailed`]. Fire-and-forget
    /// only fails on validation or serialization.
    fn deliver(
        &self,
        endpoint: &str,
        report: &Report,
        mode: DeliveryMode,
    ) -> Result<DeliveryResult, MonitorError>;

    /// Wait up to `timeout` for fire-and-forget deliveries still in flight
    ///
    /// Returns how many were still running when the wait ended.
    fn flush(&self, _timeout: Duration) -> usize {
        0
    }
}

/// 2xx only
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(is_success(299));
        assert!(!is_success(199));
        assert!(!is_success(301));
        assert!(!is_success(500));
    }
}
