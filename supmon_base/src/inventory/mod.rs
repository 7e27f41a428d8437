//! Host inventory: core version, installed add-ons and their updates

pub mod collector;
pub mod host;

pub use collector::{derive_slug, Inventory, InventoryCollector};
pub use host::{
    AddonMetadata, HostEnvironment, HostError, InstalledAddon, StaticHost, UpdateCache,
    UpdateOffer,
};
