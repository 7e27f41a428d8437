//! # Host Adapters

pub mod manifest;
pub mod registry;

pub use manifest::{HostManifest, ManifestHost};
pub use registry::FileScheduleRegistry;
