//! Public service surface: the monitor object and its error type

pub mod errors;
pub mod monitor;

pub use errors::MonitorError;
pub use monitor::{Monitor, MonitorDeps, MonitorInfo, PostOutcome};
