//! The spawn-intent file: a short-lived, file-backed mutex asserting "a
//! spawn for this orchestration is in progress" (§3, §4.5, P4).

use crate::atomic::{read_json_safe, write_json_atomic, AtomicIoError};
use crate::paths::WorkflowsLayout;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const SPAWN_INTENT_TTL_SECS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnIntent {
    pub skill: String,
    pub orchestration_id: String,
    pub timestamp: DateTime<Utc>,
}

impl SpawnIntent {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.timestamp).num_seconds() >= SPAWN_INTENT_TTL_SECS
    }
}

#[derive(Clone)]
pub struct SpawnIntentStore {
    path: PathBuf,
}

impl SpawnIntentStore {
    pub fn new(layout: &WorkflowsLayout, orchestration_id: &str) -> Self {
        Self {
            path: layout.spawn_intent(orchestration_id),
        }
    }

    pub fn read(&self) -> Result<Option<SpawnIntent>, AtomicIoError> {
        read_json_safe(&self.path)
    }

    pub fn write(&self, intent: &SpawnIntent) -> Result<(), AtomicIoError> {
        write_json_atomic(&self.path, intent)
    }

    pub fn delete(&self) -> Result<(), AtomicIoError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Visit the intent file and decide whether a caller may proceed to
    /// spawn: `true` if no live intent exists (any stale one found is
    /// deleted first), `false` if a fresh intent is already held.
    pub fn try_acquire(&self, skill: &str, orchestration_id: &str, now: DateTime<Utc>) -> Result<bool, AtomicIoError> {
        if let Some(existing) = self.read()? {
            if !existing.is_expired(now) {
                return Ok(false);
            }
            self.delete()?;
        }
        self.write(&SpawnIntent {
            skill: skill.to_string(),
            orchestration_id: orchestration_id.to_string(),
            timestamp: now,
        })?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "spawn_intent_tests.rs"]
mod tests;
