//! Runner-marker files: the on-disk liveness assertion "some process is
//! supervising this orchestration" (§3, §4.8, used by the reconciler C8).

use crate::atomic::{read_json_safe, write_json_atomic, AtomicIoError};
use crate::paths::WorkflowsLayout;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerMarker {
    pub orchestration_id: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RunnerMarkerStore {
    layout: WorkflowsLayout,
}

impl RunnerMarkerStore {
    pub fn new(layout: WorkflowsLayout) -> Self {
        Self { layout }
    }

    pub fn write(&self, orchestration_id: &str, pid: u32, started_at: DateTime<Utc>) -> Result<(), AtomicIoError> {
        let marker = RunnerMarker {
            orchestration_id: orchestration_id.to_string(),
            pid,
            started_at,
        };
        write_json_atomic(&self.layout.runner_marker(orchestration_id), &marker)
    }

    pub fn read(&self, orchestration_id: &str) -> Result<Option<RunnerMarker>, AtomicIoError> {
        read_json_safe(&self.layout.runner_marker(orchestration_id))
    }

    pub fn delete(&self, orchestration_id: &str) -> Result<(), AtomicIoError> {
        let path = self.layout.runner_marker(orchestration_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Every `runner-*.json` file in the layout's root, for C8's startup
    /// scan. Unparseable markers are surfaced as `(path, None)` so the
    /// reconciler can delete them; a path whose content is unparseable
    /// never produces an error here.
    pub fn list(&self) -> Result<Vec<(PathBuf, Option<RunnerMarker>)>, AtomicIoError> {
        let root = self.layout.root();
        if !root.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            let is_marker = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("runner-") && n.ends_with(".json"));
            if !is_marker {
                continue;
            }
            let marker: Option<RunnerMarker> = read_json_safe(&path)?;
            out.push((path, marker));
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "runner_marker_tests.rs"]
mod tests;
