//! # Report Types
//!
//! Wire format of the report posted to the collection endpoint. Field names
//! are camelCase on the wire.

use crate::version::UpdateType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete report envelope; immutable once compiled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Stable site URL identifying the reporter
    pub identity: String,

    /// Unix seconds at compilation
    pub timestamp: i64,

    /// Hex SHA-256 over identity, secret and timestamp
    pub signature: String,

    pub core: CoreFacts,

    /// Collector insertion order; not semantically meaningful
    pub addons: Vec<AddonRecord>,
}

/// Core application version facts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreFacts {
    pub current: String,
    pub recommended: Option<String>,
    #[serde(default)]
    pub update_type: UpdateType,
}

/// Kind of installable unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddonKind {
    #[serde(rename = "plugin")]
    Plugin,
    #[serde(rename = "mu-plugin")]
    MustUsePlugin,
    #[serde(rename = "drop-in")]
    DropIn,
}

impl AddonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddonKind::Plugin => "plugin",
            AddonKind::MustUsePlugin => "mu-plugin",
            AddonKind::DropIn => "drop-in",
        }
    }

    /// Must-use plugins and drop-ins cannot be deactivated
    pub fn always_active(&self) -> bool {
        !matches!(self, AddonKind::Plugin)
    }
}

impl fmt::Display for AddonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One installed add-on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonRecord {
    /// Identity key, unique within a report
    pub slug: String,
    pub display_name: String,
    pub kind: AddonKind,
    pub current_version: String,
    pub recommended_version: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub update_type: UpdateType,
}

impl Report {
    /// A report with neither a core version nor add-ons carries nothing
    pub fn is_empty(&self) -> bool {
        self.core.current.is_empty() && self.addons.is_empty()
    }

    pub fn addon(&self, slug: &str) -> Option<&AddonRecord> {
        self.addons.iter().find(|addon| addon.slug == slug)
    }

    /// Add-ons with a known newer version
    pub fn pending_updates(&self) -> Vec<&AddonRecord> {
        self.addons
            .iter()
            .filter(|addon| addon.update_type.is_update())
            .collect()
    }

    /// Serialize to pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize to compact JSON string (request body)
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report {
            identity: "https://site.example.com".to_string(),
            timestamp: 1_700_000_000,
            signature: "ab".repeat(32),
            core: CoreFacts {
                current: "6.4.2".to_string(),
                recommended: Some("6.5.0".to_string()),
                update_type: UpdateType::Minor,
            },
            addons: vec![
                AddonRecord {
                    slug: "akismet".to_string(),
                    display_name: "Akismet Anti-Spam".to_string(),
                    kind: AddonKind::Plugin,
                    current_version: "5.3".to_string(),
                    recommended_version: Some("5.3.1".to_string()),
                    active: false,
                    update_type: UpdateType::Patch,
                },
                AddonRecord {
                    slug: "object-cache.php".to_string(),
                    display_name: "Redis Object Cache Drop-In".to_string(),
                    kind: AddonKind::DropIn,
                    current_version: "2.5.0".to_string(),
                    recommended_version: None,
                    active: true,
                    update_type: UpdateType::None,
                },
            ],
        }
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample();
        let json = report.to_json_compact().unwrap();
        assert_eq!(Report::from_json(&json).unwrap(), report);
    }

    #[test]
    fn test_wire_field_names() {
        let value: serde_json::Value = serde_json::to_value(sample()).unwrap();

        assert_eq!(value["identity"], "https://site.example.com");
        assert_eq!(value["core"]["updateType"], "minor");
        assert_eq!(value["addons"][0]["displayName"], "Akismet Anti-Spam");
        assert_eq!(value["addons"][0]["currentVersion"], "5.3");
        assert_eq!(value["addons"][0]["kind"], "plugin");
        assert_eq!(value["addons"][1]["kind"], "drop-in");
        assert!(value["addons"][1]["recommendedVersion"].is_null());
    }

    #[test]
    fn test_pending_updates_and_lookup() {
        let report = sample();
        let pending = report.pending_updates();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].slug, "akismet");
        assert!(report.addon("object-cache.php").is_some());
        assert!(report.addon("missing").is_none());
    }

    #[test]
    fn test_emptiness() {
        let mut report = sample();
        assert!(!report.is_empty());
        report.addons.clear();
        report.core.current.clear();
        assert!(report.is_empty());
    }

    #[test]
    fn test_kind_activity() {
        assert!(!AddonKind::Plugin.always_active());
        assert!(AddonKind::MustUsePlugin.always_active());
        assert!(AddonKind::DropIn.always_active());
        assert_eq!(AddonKind::MustUsePlugin.to_string(), "mu-plugin");
    }
}
