//! Schedule registry boundary

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{reason}")]
pub struct RegistryError {
    pub reason: String,
}

impl RegistryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Host-side store of named periodic events and their next run time
pub trait ScheduleRegistry: Send + Sync {
    fn next_run(&self, event: &str) -> Result<Option<DateTime<Utc>>, RegistryError>;

    /// Insert or replace the next run of `event`
    fn set_next_run(&self, event: &str, at: DateTime<Utc>) -> Result<(), RegistryError>;

    /// Remove `event`; removing an unknown event is not an error
    fn remove(&self, event: &str) -> Result<(), RegistryError>;
}

/// Process-local registry
#[derive(Debug, Default)]
pub struct MemoryScheduleRegistry {
    events: Mutex<BTreeMap<String, DateTime<Utc>>>,
    failure: Option<String>,
}

impl MemoryScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose every call fails with `reason`
    pub fn failing(reason: &str) -> Self {
        Self {
            events: Mutex::default(),
            failure: Some(reason.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn events(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, DateTime<Utc>>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), RegistryError> {
        match &self.failure {
            Some(reason) => Err(RegistryError::new(reason.clone())),
            None => Ok(()),
        }
    }
}

impl ScheduleRegistry for MemoryScheduleRegistry {
    fn next_run(&self, event: &str) -> Result<Option<DateTime<Utc>>, RegistryError> {
        self.check()?;
        Ok(self.events().get(event).copied())
    }

    fn set_next_run(&self, event: &str, at: DateTime<Utc>) -> Result<(), RegistryError> {
        self.check()?;
        self.events().insert(event.to_string(), at);
        Ok(())
    }

    fn remove(&self, event: &str) -> Result<(), RegistryError> {
        self.check()?;
        self.events().remove(event);
        Ok(())
    }
}
