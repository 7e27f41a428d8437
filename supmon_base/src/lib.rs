//! # Support Monitor - scheduled self-reporting pipeline

#[macro_use]
pub mod logging;

pub mod api;
pub mod config;
pub mod inventory;
pub mod report;
pub mod scheduler;
pub mod state;
pub mod transport;
pub mod version;

// Convenience re-exports
pub use api::*;
pub use config::MonitorConfig;

pub mod prelude {
    pub use crate::api::{Monitor, MonitorDeps, MonitorError, MonitorInfo, PostOutcome};
    pub use crate::config::{LoggingPreferences, MonitorConfig};

    pub use crate::inventory::{
        AddonMetadata, HostEnvironment, HostError, InstalledAddon, Inventory, InventoryCollector,
        StaticHost, UpdateCache, UpdateOffer,
    };

    pub use crate::report::{
        AddonKind, AddonRecord, Clock, CoreFacts, Report, ReportCompiler, SystemClock,
    };

    pub use crate::scheduler::{MemoryScheduleRegistry, RegistryError, ScheduleRegistry, Scheduler};
    pub use crate::state::{JsonFileStore, MemoryStore, Outcome, RunState, RunStateStore};
    pub use crate::transport::{DeliveryMode, DeliveryResult, HttpTransport, Transport};
    pub use crate::version::UpdateType;
}
