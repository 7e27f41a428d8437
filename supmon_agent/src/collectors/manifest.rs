//! # Manifest Host
//!
//! Host inventory read from a JSON manifest the host application exports.
//!
//! ```json
//! {
//!   "core": { "version": "6.4.2", "updates": ["6.5.0"] },
//!   "plugins": { "akismet/akismet.php": { "name": "Akismet", "version": "5.3" } },
//!   "mu_plugins": {},
//!   "dropins": { "object-cache.php": { "name": "Object Cache", "version": "2.5.0" } },
//!   "update_plugins": { "response": {}, "no_update": {} },
//!   "active_plugins": ["akismet/akismet.php"],
//!   "network_active_plugins": []
//! }
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use supmon_base::inventory::{
    AddonMetadata, HostEnvironment, HostError, InstalledAddon, UpdateCache,
};
use supmon_base::logging::codes;
use supmon_base::{log_debug, log_warning};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoreManifest {
    pub version: Option<String>,
    /// Offered core versions, most recommended first
    pub updates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostManifest {
    pub core: CoreManifest,
    pub plugins: BTreeMap<String, AddonMetadata>,
    pub mu_plugins: BTreeMap<String, AddonMetadata>,
    pub dropins: BTreeMap<String, AddonMetadata>,
    pub update_plugins: UpdateCache,
    pub active_plugins: BTreeSet<String>,
    pub network_active_plugins: BTreeSet<String>,
}

impl HostManifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn read(path: &Path) -> Result<Self, HostError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HostError::new(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&raw)
            .map_err(|e| HostError::new(format!("invalid manifest {}: {}", path.display(), e)))
    }
}

/// [`HostEnvironment`] backed by a manifest file
#[derive(Debug)]
pub struct ManifestHost {
    path: Option<PathBuf>,
    manifest: RwLock<HostManifest>,
}

impl ManifestHost {
    /// Load the manifest at `path`; a missing or invalid file yields an empty inventory
    pub fn load(path: Option<&Path>) -> Self {
        let manifest = match path {
            Some(path) => HostManifest::read(path).unwrap_or_else(|e| {
                log_warning!(code = codes::collection::HOST_DATA_UNAVAILABLE,
                    "Host manifest unavailable, reporting empty inventory",
                    "error" => e
                );
                HostManifest::default()
            }),
            None => {
                log_warning!(code = codes::collection::HOST_DATA_UNAVAILABLE,
                    "No host manifest configured"
                );
                HostManifest::default()
            }
        };

        Self {
            path: path.map(Path::to_path_buf),
            manifest: RwLock::new(manifest),
        }
    }

    pub fn from_manifest(manifest: HostManifest) -> Self {
        Self {
            path: None,
            manifest: RwLock::new(manifest),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_manifest<T>(&self, f: impl FnOnce(&HostManifest) -> T) -> T {
        let guard = self
            .manifest
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }
}

fn installed(addons: &BTreeMap<String, AddonMetadata>) -> Vec<InstalledAddon> {
    addons
        .iter()
        .map(|(file, metadata)| InstalledAddon::new(file, metadata.clone()))
        .collect()
}

impl HostEnvironment for ManifestHost {
    fn core_version(&self) -> Option<String> {
        self.with_manifest(|m| m.core.version.clone())
    }

    fn core_updates(&self) -> Vec<String> {
        self.with_manifest(|m| m.core.updates.clone())
    }

    /// Re-read the manifest so a freshly exported update cache is picked up
    fn refresh_updates(&self) -> Result<(), HostError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let fresh = HostManifest::read(path)?;
        *self
            .manifest
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = fresh;

        log_debug!("Host manifest reloaded", "path" => path.display());
        Ok(())
    }

    fn plugins(&self) -> Vec<InstalledAddon> {
        self.with_manifest(|m| installed(&m.plugins))
    }

    fn mu_plugins(&self) -> Vec<InstalledAddon> {
        self.with_manifest(|m| installed(&m.mu_plugins))
    }

    fn dropins(&self) -> Vec<InstalledAddon> {
        self.with_manifest(|m| installed(&m.dropins))
    }

    fn plugin_updates(&self) -> UpdateCache {
        self.with_manifest(|m| m.update_plugins.clone())
    }

    fn is_active(&self, file: &str) -> bool {
        self.with_manifest(|m| m.active_plugins.contains(file))
    }

    fn is_active_for_network(&self, file: &str) -> bool {
        self.with_manifest(|m| m.network_active_plugins.contains(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use supmon_base::inventory::InventoryCollector;
    use supmon_base::report::AddonKind;

    const MANIFEST: &str = r#"{
        "core": { "version": "6.4.2-src", "updates": ["6.5.0", "6.4.3"] },
        "plugins": {
            "akismet/akismet.php": { "name": "Akismet", "version": "5.3" },
            "hello.php": { "name": "Hello Dolly", "version": "1.7.2" }
        },
        "mu_plugins": { "loader.php": { "name": "Loader", "version": "0.1" } },
        "dropins": { "object-cache.php": { "name": "Object Cache", "version": "2.5.0" } },
        "update_plugins": {
            "response": { "akismet/akismet.php": { "slug": "akismet", "new_version": "5.3.1" } },
            "no_update": { "hello.php": { "slug": "hello-dolly", "new_version": "1.7.2" } }
        },
        "active_plugins": ["hello.php"]
    }"#;

    #[test]
    fn test_manifest_feeds_collector() {
        let host = ManifestHost::from_manifest(HostManifest::from_json(MANIFEST).unwrap());
        let inventory = InventoryCollector::new(Arc::new(host)).collect();

        assert_eq!(inventory.core.current, "6.4.2");
        assert_eq!(inventory.core.recommended.as_deref(), Some("6.5.0"));
        assert_eq!(inventory.addons.len(), 4);

        let akismet = inventory.addons.iter().find(|a| a.slug == "akismet").unwrap();
        assert_eq!(akismet.recommended_version.as_deref(), Some("5.3.1"));
        assert!(!akismet.active);

        let hello = inventory.addons.iter().find(|a| a.slug == "hello-dolly").unwrap();
        assert!(hello.active);

        let dropin = inventory
            .addons
            .iter()
            .find(|a| a.kind == AddonKind::DropIn)
            .unwrap();
        assert_eq!(dropin.slug, "object-cache.php");
    }

    #[test]
    fn test_missing_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let host = ManifestHost::load(Some(&dir.path().join("absent.json")));

        assert!(host.core_version().is_none());
        assert!(host.plugins().is_empty());
        assert!(host.refresh_updates().is_err());
    }

    #[test]
    fn test_refresh_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, r#"{"core": {"version": "6.4.2"}}"#).unwrap();

        let host = ManifestHost::load(Some(&path));
        assert_eq!(host.core_version().as_deref(), Some("6.4.2"));

        std::fs::write(&path, r#"{"core": {"version": "6.5.0"}}"#).unwrap();
        host.refresh_updates().unwrap();
        assert_eq!(host.core_version().as_deref(), Some("6.5.0"));
    }

    #[test]
    fn test_no_path_refresh_is_noop() {
        let host = ManifestHost::load(None);
        assert!(host.refresh_updates().is_ok());
        assert!(host.path().is_none());
    }
}
