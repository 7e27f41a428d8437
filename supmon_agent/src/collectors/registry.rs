//! File-backed schedule registry
//!
//! Stores a JSON map of event name to next-run Unix timestamp.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use supmon_base::config::constants::state::SCHEDULE_FILE;
use supmon_base::scheduler::{RegistryError, ScheduleRegistry};

type EventMap = BTreeMap<String, i64>;

#[derive(Debug)]
pub struct FileScheduleRegistry {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileScheduleRegistry {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(SCHEDULE_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<EventMap, RegistryError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(EventMap::new()),
            Err(e) => {
                return Err(RegistryError::new(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&raw).map_err(|e| {
            RegistryError::new(format!("invalid registry {}: {}", self.path.display(), e))
        })
    }

    fn write(&self, events: &EventMap) -> Result<(), RegistryError> {
        let fail = |e: std::io::Error| {
            RegistryError::new(format!("cannot write {}: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(fail)?;
        }
        let json = serde_json::to_string_pretty(events)
            .map_err(|e| RegistryError::new(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(fail)?;
        std::fs::rename(&tmp, &self.path).map_err(fail)
    }

    fn modify(&self, f: impl FnOnce(&mut EventMap)) -> Result<(), RegistryError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut events = self.read()?;
        f(&mut events);
        self.write(&events)
    }
}

impl ScheduleRegistry for FileScheduleRegistry {
    fn next_run(&self, event: &str) -> Result<Option<DateTime<Utc>>, RegistryError> {
        let events = self.read()?;
        Ok(events
            .get(event)
            .and_then(|ts| Utc.timestamp_opt(*ts, 0).single()))
    }

    fn set_next_run(&self, event: &str, at: DateTime<Utc>) -> Result<(), RegistryError> {
        self.modify(|events| {
            events.insert(event.to_string(), at.timestamp());
        })
    }

    fn remove(&self, event: &str) -> Result<(), RegistryError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|events| {
            events.remove(event);
        })
    }
}
