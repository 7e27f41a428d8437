//! Last-run persistence backends

use super::RunState;
use crate::api::MonitorError;
use crate::config::constants::state::LAST_RUN_KEY;
use crate::logging::codes;
use crate::{log_debug, log_warning};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Single-slot key-value store for the last-run record
pub trait RunStateStore: Send + Sync {
    /// Stored record; absent or unreadable records yield `None`
    fn load(&self) -> Result<Option<RunState>, MonitorError>;

    /// Overwrite the stored record
    fn save(&self, state: &RunState) -> Result<(), MonitorError>;

    /// Remove the record; a no-op when nothing is stored
    fn clear(&self) -> Result<(), MonitorError>;
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

/// Stores the record as `<dir>/supmon_last_run.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", LAST_RUN_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, source: std::io::Error) -> MonitorError {
        MonitorError::Storage {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl RunStateStore for JsonFileStore {
    fn load(&self) -> Result<Option<RunState>, MonitorError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.storage_error(e)),
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                log_warning!(code = codes::state::CORRUPT_RECORD,
                    "Ignoring unreadable last-run record",
                    "path" => self.path.display(),
                    "error" => e
                );
                Ok(None)
            }
        }
    }

    fn save(&self, state: &RunState) -> Result<(), MonitorError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
        }

        let json = serde_json::to_string_pretty(state)?;

        // Write then rename so readers never see a torn record
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.storage_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.storage_error(e))?;

        log_debug!("Last-run record written", "path" => self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), MonitorError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error(e)),
        }
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Process-local store for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<RunState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: RunState) -> Self {
        Self {
            slot: Mutex::new(Some(state)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<RunState>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RunStateStore for MemoryStore {
    fn load(&self) -> Result<Option<RunState>, MonitorError> {
        Ok(self.slot().clone())
    }

    fn save(&self, state: &RunState) -> Result<(), MonitorError> {
        *self.slot() = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), MonitorError> {
        *self.slot() = None;
        Ok(())
    }
}
