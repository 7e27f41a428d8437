//! Consolidated event codes and classification system
//!
//! Single source of truth for every code the monitor logs, together with the
//! metadata used by structured output (category, severity, recommended action).

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct CodeMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl CodeMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("SYS001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("SYS002");
    pub const CONFIGURATION_ERROR: Code = Code::new("SYS003");
}

/// Inventory collection codes
pub mod collection {
    use super::Code;

    pub const UPDATE_REFRESH_FAILED: Code = Code::new("COL001");
    pub const HOST_DATA_UNAVAILABLE: Code = Code::new("COL002");
    pub const DUPLICATE_SLUG: Code = Code::new("COL003");
}

/// Report compilation codes
pub mod compilation {
    use super::Code;

    pub const NO_DATA: Code = Code::new("CMP001");
    pub const SERIALIZATION_FAILED: Code = Code::new("CMP002");
}

/// Delivery codes
pub mod delivery {
    use super::Code;

    pub const INVALID_ENDPOINT: Code = Code::new("DLV001");
    pub const DELIVERY_FAILED: Code = Code::new("DLV002");
    pub const REQUEST_FAILED: Code = Code::new("DLV003");
    pub const CLIENT_BUILD_FAILED: Code = Code::new("DLV004");
}

/// Run-state persistence codes
pub mod state {
    use super::Code;

    pub const STORE_READ_FAILED: Code = Code::new("STA001");
    pub const STORE_WRITE_FAILED: Code = Code::new("STA002");
    pub const CORRUPT_RECORD: Code = Code::new("STA003");
}

/// Scheduling codes
pub mod scheduling {
    use super::Code;

    pub const REGISTRATION_FAILED: Code = Code::new("SCH001");
    pub const RUN_IN_PROGRESS: Code = Code::new("SCH002");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("OK001");
    pub const INVENTORY_COLLECTED: Code = Code::new("OK010");
    pub const REPORT_COMPILED: Code = Code::new("OK020");
    pub const REPORT_DELIVERED: Code = Code::new("OK030");
    pub const REPORT_DISPATCHED: Code = Code::new("OK031");
    pub const RUN_STATE_SAVED: Code = Code::new("OK040");
    pub const RUN_STATE_CLEARED: Code = Code::new("OK041");
    pub const EVENT_SCHEDULED: Code = Code::new("OK050");
    pub const EVENT_UNSCHEDULED: Code = Code::new("OK051");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

static CODE_REGISTRY: OnceLock<HashMap<&'static str, CodeMetadata>> = OnceLock::new();

fn get_code_registry() -> &'static HashMap<&'static str, CodeMetadata> {
    CODE_REGISTRY.get_or_init(|| {
        let entries = [
            CodeMetadata::new(
                "SYS001",
                "System",
                Severity::Critical,
                false,
                "Internal monitor error",
                "File a bug report with the structured log output",
            ),
            CodeMetadata::new(
                "SYS002",
                "System",
                Severity::Critical,
                false,
                "Monitor failed to initialize",
                "Check the process environment and restart the agent",
            ),
            CodeMetadata::new(
                "SYS003",
                "System",
                Severity::High,
                true,
                "Invalid or incomplete configuration",
                "Set SUPMON_API_ENDPOINT or provide a configuration file",
            ),
            CodeMetadata::new(
                "COL001",
                "Collection",
                Severity::Low,
                true,
                "Host update-check refresh failed; cached data used",
                "Verify the host update service is reachable",
            ),
            CodeMetadata::new(
                "COL002",
                "Collection",
                Severity::Medium,
                true,
                "Host inventory data is missing or unreadable",
                "Regenerate the host manifest",
            ),
            CodeMetadata::new(
                "COL003",
                "Collection",
                Severity::Low,
                true,
                "Two add-ons share a slug; the later one replaced the earlier",
                "Rename one of the add-ons or fix its declared slug",
            ),
            CodeMetadata::new(
                "CMP001",
                "Compilation",
                Severity::High,
                false,
                "Compiled report carried no data",
                "Check that the host manifest lists a core version or add-ons",
            ),
            CodeMetadata::new(
                "CMP002",
                "Compilation",
                Severity::High,
                false,
                "Report could not be serialized",
                "File a bug report with the report payload",
            ),
            CodeMetadata::new(
                "DLV001",
                "Delivery",
                Severity::High,
                false,
                "Collection endpoint is malformed or points at an internal host",
                "Fix SUPMON_API_ENDPOINT or set SUPMON_ALLOW_LOOPBACK for testing",
            ),
            CodeMetadata::new(
                "DLV002",
                "Delivery",
                Severity::Medium,
                true,
                "Collection endpoint rejected the report",
                "Inspect the response body recorded in the last run",
            ),
            CodeMetadata::new(
                "DLV003",
                "Delivery",
                Severity::Medium,
                true,
                "Request to the collection endpoint failed",
                "Check network connectivity; the next trigger will try again",
            ),
            CodeMetadata::new(
                "DLV004",
                "Delivery",
                Severity::Critical,
                false,
                "HTTP client could not be constructed",
                "Check TLS configuration of the host",
            ),
            CodeMetadata::new(
                "STA001",
                "State",
                Severity::Medium,
                true,
                "Last-run record could not be read",
                "Check permissions on the state directory",
            ),
            CodeMetadata::new(
                "STA002",
                "State",
                Severity::High,
                true,
                "Last-run record could not be written",
                "Check permissions and free space on the state directory",
            ),
            CodeMetadata::new(
                "STA003",
                "State",
                Severity::Low,
                true,
                "Last-run record is corrupt and was ignored",
                "No action needed; the next run overwrites it",
            ),
            CodeMetadata::new(
                "SCH001",
                "Scheduling",
                Severity::High,
                true,
                "Periodic event could not be registered",
                "Check permissions on the schedule registry file",
            ),
            CodeMetadata::new(
                "SCH002",
                "Scheduling",
                Severity::Low,
                true,
                "A report run is already in progress",
                "No action needed",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

/// Get full metadata for a code
pub fn get_code_metadata(code: &str) -> Option<&'static CodeMetadata> {
    get_code_registry().get(code)
}

/// Get severity for a code
pub fn get_severity(code: &str) -> Severity {
    get_code_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Low)
}

/// Check whether an error code is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_code_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Get human-readable description for a code
pub fn get_description(code: &str) -> &'static str {
    get_code_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for a code
pub fn get_action(code: &str) -> &'static str {
    get_code_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category for a code
pub fn get_category(code: &str) -> &'static str {
    get_code_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("General")
}
