//! The startup reconciler (C8, §4.8): scans the runner-marker directory
//! once per process start and drops orphans left behind by a process that
//! died without cleaning up after itself.

use loom_storage::{RunnerMarker, RunnerMarkerStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciledMarker {
    /// Belonged to this process (same PID) — same-process restart
    /// reconciliation; the caller should claim the orchestration and
    /// register a fresh generation for it.
    Claimed { orchestration_id: String },
    /// The recorded PID didn't match ours. Per §4.8, a foreign PID is
    /// never liveness-checked (PIDs are reusable) — always orphaned.
    Orphaned { orchestration_id: String },
    /// The marker file itself didn't parse; deleted outright.
    Unparseable,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub markers: Vec<ReconciledMarker>,
}

impl ReconcileReport {
    /// Orchestration ids worth offering the dashboard a relaunch for.
    pub fn orphaned_orchestration_ids(&self) -> Vec<&str> {
        self.markers
            .iter()
            .filter_map(|m| match m {
                ReconciledMarker::Orphaned { orchestration_id } => Some(orchestration_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// §4.8: scan every `runner-*.json` marker. Foreign-PID and unparseable
/// markers are deleted unconditionally; a marker matching `current_pid`
/// is left in place for the caller to claim (the caller registers a fresh
/// generation and continues supervising, rather than this function
/// deleting state another code path still owns).
pub fn reconcile_runner_markers(
    store: &RunnerMarkerStore,
    current_pid: u32,
) -> loom_core::Result<ReconcileReport> {
    let mut report = ReconcileReport::default();

    for (path, marker) in store.list()? {
        match marker {
            None => {
                let _ = std::fs::remove_file(&path);
                report.markers.push(ReconciledMarker::Unparseable);
            }
            Some(RunnerMarker {
                orchestration_id,
                pid,
                ..
            }) if pid == current_pid => {
                report.markers.push(ReconciledMarker::Claimed { orchestration_id });
            }
            Some(RunnerMarker { orchestration_id, .. }) => {
                let _ = std::fs::remove_file(&path);
                report.markers.push(ReconciledMarker::Orphaned { orchestration_id });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
