//! Report model and compilation

pub mod compiler;
pub mod types;

pub use compiler::{sign, Clock, FixedClock, ReportCompiler, SystemClock};
pub use types::{AddonKind, AddonRecord, CoreFacts, Report};
