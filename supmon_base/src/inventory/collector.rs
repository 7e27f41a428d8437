//! Inventory collection from the host environment

use super::host::{HostEnvironment, InstalledAddon, UpdateCache};
use crate::logging::codes;
use crate::report::{AddonKind, AddonRecord, CoreFacts};
use crate::{log_debug, log_success, log_warning};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Suffix development builds append to the core version
const DEV_BUILD_SUFFIX: &str = "-src";

/// Raw facts gathered from the host, before update labelling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub core: CoreFacts,
    pub addons: Vec<AddonRecord>,
}

impl Inventory {
    /// No core version and no add-ons
    pub fn is_empty(&self) -> bool {
        self.core.current.is_empty() && self.addons.is_empty()
    }
}

/// Gathers core and add-on facts; never fails
pub struct InventoryCollector {
    host: Arc<dyn HostEnvironment>,
}

impl InventoryCollector {
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }

    pub fn collect(&self) -> Inventory {
        if let Err(e) = self.host.refresh_updates() {
            log_warning!(code = codes::collection::UPDATE_REFRESH_FAILED,
                "Update refresh failed, continuing with cached data",
                "error" => e
            );
        }

        let inventory = Inventory {
            core: self.collect_core(),
            addons: self.collect_addons(),
        };

        log_success!(
            codes::success::INVENTORY_COLLECTED,
            "Inventory collected",
            "core" => &inventory.core.current,
            "addons" => inventory.addons.len()
        );

        inventory
    }

    fn collect_core(&self) -> CoreFacts {
        let current = self
            .host
            .core_version()
            .map(|v| {
                let trimmed = v.trim();
                trimmed
                    .strip_suffix(DEV_BUILD_SUFFIX)
                    .unwrap_or(trimmed)
                    .to_string()
            })
            .unwrap_or_default();

        let recommended = self
            .host
            .core_updates()
            .into_iter()
            .next()
            .filter(|v| !v.trim().is_empty());

        CoreFacts {
            current,
            recommended,
            ..Default::default()
        }
    }

    fn collect_addons(&self) -> Vec<AddonRecord> {
        let updates = self.host.plugin_updates();

        let tagged = self
            .host
            .plugins()
            .into_iter()
            .map(|a| (AddonKind::Plugin, a))
            .chain(self.host.mu_plugins().into_iter().map(|a| (AddonKind::MustUsePlugin, a)))
            .chain(self.host.dropins().into_iter().map(|a| (AddonKind::DropIn, a)));

        let mut records: Vec<AddonRecord> = Vec::new();
        let mut files: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for (kind, addon) in tagged {
            let record = self.model_addon(kind, &addon, &updates);

            match positions.get(&record.slug) {
                Some(&index) => {
                    log_warning!(code = codes::collection::DUPLICATE_SLUG,
                        "Duplicate add-on slug, keeping the later record",
                        "slug" => &record.slug,
                        "replaced" => &files[index],
                        "kept" => &addon.file
                    );
                    records[index] = record;
                    files[index] = addon.file;
                }
                None => {
                    positions.insert(record.slug.clone(), records.len());
                    records.push(record);
                    files.push(addon.file);
                }
            }
        }

        records
    }

    fn model_addon(&self, kind: AddonKind, addon: &InstalledAddon, updates: &UpdateCache) -> AddonRecord {
        let merged = match updates.offer_for(&addon.file) {
            Some(offer) => addon.metadata.merged_over(&offer.metadata),
            None => addon.metadata.clone(),
        };

        let slug = merged
            .slug
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| derive_slug(&addon.file));

        let active = kind.always_active()
            || self.host.is_active(&addon.file)
            || self.host.is_active_for_network(&addon.file);

        log_debug!("Modelled add-on", "file" => &addon.file, "slug" => &slug, "kind" => kind);

        AddonRecord {
            display_name: merged.name.unwrap_or_else(|| slug.clone()),
            slug,
            kind,
            current_version: merged.version.unwrap_or_default(),
            recommended_version: updates.recommended_for(&addon.file).map(str::to_string),
            active,
            update_type: Default::default(),
        }
    }
}

/// Parent directory of the add-on file, or the file itself when top-level
pub fn derive_slug(file: &str) -> String {
    let normalized = file.replace('\\', "/");
    let path = Path::new(normalized.trim_start_matches('/'));

    match path.parent().map(|p| p.to_string_lossy().to_string()) {
        Some(parent) if !parent.is_empty() && parent != "." => parent,
        _ => path.to_string_lossy().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::host::{AddonMetadata, StaticHost, UpdateOffer};

    fn collector(host: StaticHost) -> InventoryCollector {
        InventoryCollector::new(Arc::new(host))
    }

    #[test]
    fn test_slug_derivation() {
        assert_eq!(derive_slug("akismet/akismet.php"), "akismet");
        assert_eq!(derive_slug("hello.php"), "hello.php");
        assert_eq!(derive_slug("vendor/pack/main.php"), "vendor/pack");
        assert_eq!(derive_slug("object-cache.php"), "object-cache.php");
    }

    #[test]
    fn test_core_version_strips_dev_suffix() {
        let inventory = collector(
            StaticHost::new()
                .with_core("6.5-src")
                .with_core_update("6.5.2")
                .with_core_update("6.4.4"),
        )
        .collect();

        assert_eq!(inventory.core.current, "6.5");
        assert_eq!(inventory.core.recommended.as_deref(), Some("6.5.2"));
    }

    #[test]
    fn test_missing_core_degrades_to_empty() {
        let inventory = collector(StaticHost::new()).collect();
        assert!(inventory.core.current.is_empty());
        assert!(inventory.core.recommended.is_none());
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_kinds_activity_and_updates() {
        let host = StaticHost::new()
            .with_core("6.4.2")
            .with_plugin("akismet/akismet.php", AddonMetadata::new("Akismet", "5.3"))
            .with_plugin("hello.php", AddonMetadata::new("Hello Dolly", "1.7.2"))
            .with_plugin("network/network.php", AddonMetadata::new("Network", "1.0"))
            .with_mu_plugin("loader.php", AddonMetadata::new("Loader", "0.1"))
            .with_dropin("object-cache.php", AddonMetadata::new("Object Cache", "2.5.0"))
            .with_active("hello.php")
            .with_network_active("network/network.php")
            .with_update(
                "akismet/akismet.php",
                UpdateOffer {
                    metadata: AddonMetadata::default().with_slug("akismet"),
                    new_version: Some("5.3.1".to_string()),
                },
            );

        let inventory = collector(host).collect();
        let by_slug = |slug: &str| {
            inventory
                .addons
                .iter()
                .find(|a| a.slug == slug)
                .cloned()
                .unwrap()
        };

        let akismet = by_slug("akismet");
        assert_eq!(akismet.kind, AddonKind::Plugin);
        assert!(!akismet.active);
        assert_eq!(akismet.recommended_version.as_deref(), Some("5.3.1"));

        assert!(by_slug("hello.php").active);
        assert!(by_slug("network").active);
        assert!(by_slug("loader.php").active);

        let dropin = by_slug("object-cache.php");
        assert_eq!(dropin.kind, AddonKind::DropIn);
        assert!(dropin.active);
        assert!(dropin.recommended_version.is_none());

        // Insertion order: plugins, then mu-plugins, then drop-ins
        let kinds: Vec<AddonKind> = inventory.addons.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AddonKind::Plugin,
                AddonKind::Plugin,
                AddonKind::Plugin,
                AddonKind::MustUsePlugin,
                AddonKind::DropIn
            ]
        );
    }

    #[test]
    fn test_declared_fields_win_over_update_cache() {
        let host = StaticHost::new()
            .with_plugin("seo/seo.php", AddonMetadata::new("Local SEO", "3.0"))
            .with_no_update(
                "seo/seo.php",
                UpdateOffer {
                    metadata: AddonMetadata {
                        slug: Some("wordpress-seo".to_string()),
                        name: Some("Remote SEO".to_string()),
                        version: Some("9.9".to_string()),
                    },
                    new_version: Some("3.0".to_string()),
                },
            );

        let inventory = collector(host).collect();
        let record = &inventory.addons[0];

        assert_eq!(record.slug, "wordpress-seo");
        assert_eq!(record.display_name, "Local SEO");
        assert_eq!(record.current_version, "3.0");
        // A no-update entry never recommends a version
        assert!(record.recommended_version.is_none());
    }

    #[test]
    fn test_slug_collision_is_last_wins_in_place() {
        let host = StaticHost::new()
            .with_plugin("cache/cache.php", AddonMetadata::new("Cache Plugin", "1.0"))
            .with_plugin("other/other.php", AddonMetadata::new("Other", "1.0"))
            .with_mu_plugin(
                "cache-loader.php",
                AddonMetadata::new("Cache Loader", "2.0").with_slug("cache"),
            );

        let inventory = collector(host).collect();

        assert_eq!(inventory.addons.len(), 2);
        assert_eq!(inventory.addons[0].slug, "cache");
        assert_eq!(inventory.addons[0].display_name, "Cache Loader");
        assert_eq!(inventory.addons[0].kind, AddonKind::MustUsePlugin);
        assert_eq!(inventory.addons[1].slug, "other");
    }

    #[test]
    fn test_refresh_failure_does_not_stop_collection() {
        let host = Arc::new(
            StaticHost::new()
                .with_core("6.4.2")
                .with_refresh_error("update server unreachable"),
        );
        let inventory = InventoryCollector::new(host.clone()).collect();

        assert_eq!(host.refresh_count(), 1);
        assert_eq!(inventory.core.current, "6.4.2");
    }

    #[test]
    fn test_missing_metadata_degrades() {
        let host = StaticHost::new().with_plugin("bare/bare.php", AddonMetadata::default());
        let inventory = collector(host).collect();
        let record = &inventory.addons[0];

        assert_eq!(record.slug, "bare");
        assert_eq!(record.display_name, "bare");
        assert_eq!(record.current_version, "");
    }
}
