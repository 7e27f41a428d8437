//! Report compilation
//!
//! Pulls a fresh inventory on every call, labels update deltas, stamps the
//! compile time and signs the envelope. Nothing is cached between calls.

use super::types::Report;
use crate::api::MonitorError;
use crate::inventory::{HostEnvironment, InventoryCollector};
use crate::logging::codes;
use crate::version;
use crate::{log_error, log_success};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Time source for report stamping
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Lowercase hex SHA-256 of `identity ++ secret ++ timestamp`
pub fn sign(identity: &str, secret: &str, timestamp: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

pub struct ReportCompiler {
    collector: InventoryCollector,
    clock: Arc<dyn Clock>,
}

impl ReportCompiler {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self::with_clock(host, Arc::new(SystemClock))
    }

    pub fn with_clock(host: Arc<dyn HostEnvironment>, clock: Arc<dyn Clock>) -> Self {
        Self {
            collector: InventoryCollector::new(host),
            clock,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Build a signed report from the current inventory
    pub fn compile(&self, secret: &str, identity: &str) -> Result<Report, MonitorError> {
        let mut inventory = self.collector.collect();

        if inventory.is_empty() {
            log_error!(codes::compilation::NO_DATA, "Inventory is empty, nothing to report");
            return Err(MonitorError::NoData);
        }

        inventory.core.update_type = version::compare_optional(
            &inventory.core.current,
            inventory.core.recommended.as_deref(),
        );
        for addon in inventory.addons.iter_mut() {
            addon.update_type = version::compare_optional(
                &addon.current_version,
                addon.recommended_version.as_deref(),
            );
        }

        let timestamp = self.clock.now().timestamp();
        let report = Report {
            identity: identity.to_string(),
            timestamp,
            signature: sign(identity, secret, timestamp),
            core: inventory.core,
            addons: inventory.addons,
        };

        log_success!(
            codes::success::REPORT_COMPILED,
            "Report compiled",
            "identity" => identity,
            "addons" => report.addons.len(),
            "pending_updates" => report.pending_updates().len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{AddonMetadata, StaticHost, UpdateOffer};
    use crate::version::UpdateType;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    const IDENTITY: &str = "https://site.example.com";

    fn at(ts: i64) -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.timestamp_opt(ts, 0).unwrap()))
    }

    fn host() -> Arc<dyn HostEnvironment> {
        Arc::new(
            StaticHost::new()
                .with_core("6.4.2")
                .with_core_update("6.5.0")
                .with_plugin("akismet/akismet.php", AddonMetadata::new("Akismet", "5.3"))
                .with_update(
                    "akismet/akismet.php",
                    UpdateOffer {
                        new_version: Some("5.3.1".to_string()),
                        ..Default::default()
                    },
                ),
        )
    }

    #[test]
    fn test_signature_is_deterministic() {
        assert_eq!(sign(IDENTITY, "secret", 1_700_000_000), sign(IDENTITY, "secret", 1_700_000_000));
        assert_eq!(sign(IDENTITY, "secret", 0).len(), 64);
    }

    #[test]
    fn test_signature_matches_concatenation() {
        let expected = hex::encode(Sha256::digest(b"https://site.example.comsecret1700000000"));
        assert_eq!(sign(IDENTITY, "secret", 1_700_000_000), expected);
    }

    #[test]
    fn test_signature_changes_with_any_input() {
        let base = sign(IDENTITY, "secret", 1_700_000_000);
        assert_ne!(base, sign("https://other.example.com", "secret", 1_700_000_000));
        assert_ne!(base, sign(IDENTITY, "other", 1_700_000_000));
        assert_ne!(base, sign(IDENTITY, "secret", 1_700_000_001));
    }

    #[test]
    fn test_compile_stamps_and_signs() {
        let compiler = ReportCompiler::with_clock(host(), at(1_700_000_000));
        let report = compiler.compile("secret", IDENTITY).unwrap();

        assert_eq!(report.identity, IDENTITY);
        assert_eq!(report.timestamp, 1_700_000_000);
        assert_eq!(report.signature, sign(IDENTITY, "secret", 1_700_000_000));
        assert_eq!(report.core.update_type, UpdateType::Minor);
        assert_eq!(report.addons[0].update_type, UpdateType::Patch);
    }

    #[test]
    fn test_compile_is_not_cached() {
        let host = host();
        let first = ReportCompiler::with_clock(host.clone(), at(100))
            .compile("secret", IDENTITY)
            .unwrap();
        let second = ReportCompiler::with_clock(host, at(200))
            .compile("secret", IDENTITY)
            .unwrap();

        assert_ne!(first.signature, second.signature);
        assert_eq!(first.core, second.core);
    }

    #[test]
    fn test_empty_inventory_is_no_data() {
        let compiler = ReportCompiler::new(Arc::new(StaticHost::new()));
        assert_matches!(compiler.compile("secret", IDENTITY), Err(MonitorError::NoData));
    }

    #[test]
    fn test_addons_without_core_still_compile() {
        let host = StaticHost::new().with_dropin("db.php", AddonMetadata::new("DB", "1.0"));
        let report = ReportCompiler::new(Arc::new(host))
            .compile("secret", IDENTITY)
            .unwrap();
        assert_eq!(report.core.update_type, UpdateType::None);
        assert_eq!(report.addons.len(), 1);
    }
}
