//! Last-run record

use crate::report::Report;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Result of the most recent delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    /// Dispatched without waiting for a response
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Unknown => "unknown",
        }
    }
}

/// Record of the last delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// RFC 3339 time of the attempt
    pub timestamp: String,
    pub report: Report,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RunState {
    pub fn delivered(report: Report, status: u16, body: String, at: DateTime<Utc>) -> Self {
        Self::with_response(report, Outcome::Success, Some(status), Some(body), at)
    }

    pub fn failed(report: Report, status: Option<u16>, body: Option<String>, at: DateTime<Utc>) -> Self {
        Self::with_response(report, Outcome::Failure, status, body, at)
    }

    pub fn dispatched(report: Report, at: DateTime<Utc>) -> Self {
        Self::with_response(report, Outcome::Unknown, None, None, at)
    }

    fn with_response(
        report: Report,
        outcome: Outcome,
        status: Option<u16>,
        body: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            report,
            outcome,
            status,
            body,
        }
    }

    /// Parsed attempt time; `None` when the stored text is not RFC 3339
    pub fn attempted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CoreFacts;
    use chrono::TimeZone;

    fn report() -> Report {
        Report {
            identity: "https://site.example.com".to_string(),
            timestamp: 0,
            signature: String::new(),
            core: CoreFacts {
                current: "6.4.2".to_string(),
                ..Default::default()
            },
            addons: vec![],
        }
    }

    #[test]
    fn test_timestamp_round_trips() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let state = RunState::delivered(report(), 204, String::new(), at);

        assert_eq!(state.timestamp, "2024-03-01T12:30:00Z");
        assert_eq!(state.attempted_at(), Some(at));
        assert_eq!(state.outcome, Outcome::Success);
    }

    #[test]
    fn test_dispatched_has_no_response() {
        let state = RunState::dispatched(report(), Utc::now());
        assert_eq!(state.outcome, Outcome::Unknown);
        assert!(state.status.is_none());

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["outcome"], "unknown");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_unparsable_timestamp() {
        let mut state = RunState::failed(report(), Some(500), None, Utc::now());
        state.timestamp = "yesterday".to_string();
        assert!(state.attempted_at().is_none());
    }
}
