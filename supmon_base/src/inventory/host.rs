//! Host application boundary
//!
//! Everything the collector knows about the host comes through
//! [`HostEnvironment`]. Adapters live outside this crate; [`StaticHost`] is an
//! in-memory implementation for embedding and tests.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Declared add-on metadata; every field is optional on the host side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonMetadata {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

impl AddonMetadata {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            slug: None,
            name: Some(name.to_string()),
            version: Some(version.to_string()),
        }
    }

    pub fn with_slug(mut self, slug: &str) -> Self {
        self.slug = Some(slug.to_string());
        self
    }

    /// Fill unset fields from `other`; fields already set are kept
    pub fn merged_over(&self, other: &AddonMetadata) -> AddonMetadata {
        AddonMetadata {
            slug: self.slug.clone().or_else(|| other.slug.clone()),
            name: self.name.clone().or_else(|| other.name.clone()),
            version: self.version.clone().or_else(|| other.version.clone()),
        }
    }
}

/// One entry of the host's update cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateOffer {
    #[serde(flatten)]
    pub metadata: AddonMetadata,

    /// Version offered by the update source
    pub new_version: Option<String>,
}

/// Host update cache keyed by add-on file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateCache {
    /// Add-ons with an update available
    pub response: BTreeMap<String, UpdateOffer>,

    /// Add-ons known to be current
    pub no_update: BTreeMap<String, UpdateOffer>,
}

impl UpdateCache {
    /// Offer for `file`, preferring an available update over a no-update entry
    pub fn offer_for(&self, file: &str) -> Option<&UpdateOffer> {
        self.response.get(file).or_else(|| self.no_update.get(file))
    }

    /// Recommended version; only `response` entries recommend anything
    pub fn recommended_for(&self, file: &str) -> Option<&str> {
        self.response
            .get(file)
            .and_then(|offer| offer.new_version.as_deref())
    }
}

/// An installed add-on as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledAddon {
    /// Path relative to the add-on root, e.g. `akismet/akismet.php`
    pub file: String,
    pub metadata: AddonMetadata,
}

impl InstalledAddon {
    pub fn new(file: &str, metadata: AddonMetadata) -> Self {
        Self {
            file: file.to_string(),
            metadata,
        }
    }
}

/// Host refresh failure
#[derive(Debug, Clone, thiserror::Error)]
#[error("{reason}")]
pub struct HostError {
    pub reason: String,
}

impl HostError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Read access to the host application's installation
pub trait HostEnvironment: Send + Sync {
    /// Installed core version, as the host spells it
    fn core_version(&self) -> Option<String>;

    /// Core versions offered by the update cache, most recommended first
    fn core_updates(&self) -> Vec<String>;

    /// Ask the host to refresh its update cache
    fn refresh_updates(&self) -> Result<(), HostError>;

    fn plugins(&self) -> Vec<InstalledAddon>;
    fn mu_plugins(&self) -> Vec<InstalledAddon>;
    fn dropins(&self) -> Vec<InstalledAddon>;

    fn plugin_updates(&self) -> UpdateCache;

    /// Active for the current site
    fn is_active(&self, file: &str) -> bool;

    /// Active across the whole network
    fn is_active_for_network(&self, file: &str) -> bool;
}

// ============================================================================
// IN-MEMORY HOST
// ============================================================================

/// Fixed host inventory assembled with builder methods
#[derive(Debug, Default)]
pub struct StaticHost {
    core_version: Option<String>,
    core_updates: Vec<String>,
    plugins: Vec<InstalledAddon>,
    mu_plugins: Vec<InstalledAddon>,
    dropins: Vec<InstalledAddon>,
    updates: UpdateCache,
    active: BTreeSet<String>,
    network_active: BTreeSet<String>,
    refresh_error: Option<String>,
    refresh_count: Mutex<usize>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_core(mut self, version: &str) -> Self {
        self.core_version = Some(version.to_string());
        self
    }

    pub fn with_core_update(mut self, version: &str) -> Self {
        self.core_updates.push(version.to_string());
        self
    }

    pub fn with_plugin(mut self, file: &str, metadata: AddonMetadata) -> Self {
        self.plugins.push(InstalledAddon::new(file, metadata));
        self
    }

    pub fn with_mu_plugin(mut self, file: &str, metadata: AddonMetadata) -> Self {
        self.mu_plugins.push(InstalledAddon::new(file, metadata));
        self
    }

    pub fn with_dropin(mut self, file: &str, metadata: AddonMetadata) -> Self {
        self.dropins.push(InstalledAddon::new(file, metadata));
        self
    }

    pub fn with_update(mut self, file: &str, offer: UpdateOffer) -> Self {
        self.updates.response.insert(file.to_string(), offer);
        self
    }

    pub fn with_no_update(mut self, file: &str, offer: UpdateOffer) -> Self {
        self.updates.no_update.insert(file.to_string(), offer);
        self
    }

    pub fn with_active(mut self, file: &str) -> Self {
        self.active.insert(file.to_string());
        self
    }

    pub fn with_network_active(mut self, file: &str) -> Self {
        self.network_active.insert(file.to_string());
        self
    }

    /// Make every refresh fail with `reason`
    pub fn with_refresh_error(mut self, reason: &str) -> Self {
        self.refresh_error = Some(reason.to_string());
        self
    }

    /// Number of refresh requests received
    pub fn refresh_count(&self) -> usize {
        *self
            .refresh_count
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HostEnvironment for StaticHost {
    fn core_version(&self) -> Option<String> {
        self.core_version.clone()
    }

    fn core_updates(&self) -> Vec<String> {
        self.core_updates.clone()
    }

    fn refresh_updates(&self) -> Result<(), HostError> {
        *self
            .refresh_count
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;

        match &self.refresh_error {
            Some(reason) => Err(HostError::new(reason.clone())),
            None => Ok(()),
        }
    }

    fn plugins(&self) -> Vec<InstalledAddon> {
        self.plugins.clone()
    }

    fn mu_plugins(&self) -> Vec<InstalledAddon> {
        self.mu_plugins.clone()
    }

    fn dropins(&self) -> Vec<InstalledAddon> {
        self.dropins.clone()
    }

    fn plugin_updates(&self) -> UpdateCache {
        self.updates.clone()
    }

    fn is_active(&self, file: &str) -> bool {
        self.active.contains(file)
    }

    fn is_active_for_network(&self, file: &str) -> bool {
        self.network_active.contains(file)
    }
}
