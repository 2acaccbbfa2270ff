//! Persists the launcher/agent PID pair recorded at spawn time (§4.3,
//! §4.5): the record the process-health supervisor checks liveness
//! against across runner-loop iterations and after a daemon restart,
//! since the spawner itself only observes these PIDs in-process at the
//! instant it launches the child.

use crate::atomic::{read_json_safe, write_json_atomic, AtomicIoError};
use crate::paths::WorkflowsLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PersistedPids {
    pub launcher_pid: u32,
    pub agent_pid: u32,
}

#[derive(Clone)]
pub struct PidsStore {
    path: PathBuf,
}

impl PidsStore {
    pub fn new(layout: &WorkflowsLayout, workflow_id: &str) -> Self {
        Self {
            path: layout.workflow_dir(workflow_id).join("health.json"),
        }
    }

    pub fn read(&self) -> Result<Option<PersistedPids>, AtomicIoError> {
        read_json_safe(&self.path)
    }

    pub fn write(&self, pids: PersistedPids) -> Result<(), AtomicIoError> {
        write_json_atomic(&self.path, &pids)
    }

    pub fn delete(&self) -> Result<(), AtomicIoError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pids_store_tests.rs"]
mod tests;
