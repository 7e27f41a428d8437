//! Configuration module for the support monitor
//!
//! Fixed operating constants live in `constants`; everything an operator may
//! set (endpoint, secret, loopback escape hatch, paths, logging) lives in
//! `runtime` and is resolved once at startup.

pub mod constants;
pub mod runtime;

pub use runtime::{default_secret, ConfigError, LoggingPreferences, MonitorConfig};
