//! Owns `dashboard-state.json` for one project: safe-parsed reads, atomic
//! writes, and a per-store mutex serializing the read-compute-write
//! sequence the runner loop performs every iteration (§5: "a per-
//! orchestration mutex guards the sequence").

use crate::atomic::{read_json_safe, write_json_atomic, AtomicIoError};
use crate::paths::WorkflowsLayout;
use chrono::Utc;
use loom_core::DashboardState;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardStateStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DashboardStateStore {
    pub fn new(layout: &WorkflowsLayout) -> Self {
        Self {
            path: layout.dashboard_state(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the parsed document, or the safe default if absent/corrupt.
    pub fn read(&self) -> Result<DashboardState, AtomicIoError> {
        let _guard = self.lock.lock();
        Ok(read_json_safe(&self.path)?.unwrap_or_default())
    }

    pub fn write(&self, state: &DashboardState) -> Result<(), AtomicIoError> {
        let _guard = self.lock.lock();
        write_json_atomic(&self.path, state)
    }

    /// Read-modify-write under the store's lock so the sequence is
    /// serialized per orchestration within this process.
    pub fn update<F>(&self, f: F) -> Result<DashboardState, AtomicIoError>
    where
        F: FnOnce(&mut DashboardState),
    {
        let _guard = self.lock.lock();
        let mut state = read_json_safe(&self.path)?.unwrap_or_default();
        f(&mut state);
        write_json_atomic(&self.path, &state)?;
        Ok(state)
    }

    /// Append one entry to the decision log. The log is never pruned here
    /// (callers prune beyond a few hundred entries if they care to; this
    /// store does not enforce a cap, per §4.2).
    pub fn append_decision(&self, action: &str, reason: &str) -> Result<(), AtomicIoError> {
        self.update(|state| {
            state.append_decision(Utc::now(), action.to_string(), reason.to_string());
        })
        .map(|_| ())
    }
}

#[cfg(test)]
#[path = "dashboard_state_store_tests.rs"]
mod tests;
