//! Run-state persistence: the single most recent delivery attempt

pub mod run_state;
pub mod store;

pub use run_state::{Outcome, RunState};
pub use store::{JsonFileStore, MemoryStore, RunStateStore};
