//! # Support Monitor Agent
//!
//! Host adapters and command handlers for the `supmon` binary.

pub mod collectors;
pub mod commands;

use std::sync::Arc;
use supmon_base::api::{Monitor, MonitorDeps, MonitorError};
use supmon_base::config::MonitorConfig;
use supmon_base::log_error;
use supmon_base::logging::codes;
use supmon_base::state::JsonFileStore;
use supmon_base::transport::HttpTransport;

pub use collectors::{FileScheduleRegistry, HostManifest, ManifestHost};

/// Wire the file-backed adapters from resolved configuration
pub fn build_monitor(config: &MonitorConfig) -> Result<Monitor, MonitorError> {
    let state_dir = config.state_dir();
    let transport = HttpTransport::new(config.allow_loopback).map_err(|e| {
        log_error!(codes::system::INITIALIZATION_FAILURE, "Cannot initialize monitor",
            "error" => &e
        );
        e
    })?;

    let deps = MonitorDeps::new(
        Arc::new(ManifestHost::load(config.host_manifest.as_deref())),
        Arc::new(transport),
        Arc::new(JsonFileStore::new(&state_dir)),
        Arc::new(FileScheduleRegistry::new(&state_dir)),
    );

    Ok(Monitor::configure(config, deps))
}
