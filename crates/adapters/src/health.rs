//! The process-health supervisor (C3): combines raw PID liveness with
//! session-journal classification into the `WorkflowSnapshot` the decision
//! function consumes. Classifying the journal always happens before a
//! `Dead` verdict is turned into `Failed` (§4.3's ordering rule), so a
//! workflow whose process already exited cleanly is never misreported as
//! a crash.

use crate::process::process_exists;
use crate::session_journal::{classify_session, is_fresh, mtime, SessionClassification};
use chrono::{DateTime, Utc};
use loom_core::WorkflowStatus;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowHealth {
    Running,
    Stale,
    Dead,
    Unknown,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowPids {
    pub launcher_pid: Option<u32>,
    pub agent_pid: Option<u32>,
}

impl WorkflowPids {
    fn known(&self) -> Vec<u32> {
        [self.launcher_pid, self.agent_pid].into_iter().flatten().collect()
    }
}

/// The primitive §4.3 classification: liveness first, freshness second.
pub fn classify_workflow(
    pids: &WorkflowPids,
    session_path: &Path,
    now: DateTime<Utc>,
    stale_threshold_secs: u64,
) -> WorkflowHealth {
    let known = pids.known();
    if known.is_empty() {
        return WorkflowHealth::Unknown;
    }
    let alive = known.iter().any(|&pid| process_exists(pid));
    if !alive {
        return WorkflowHealth::Dead;
    }
    if is_fresh(session_path, now, stale_threshold_secs) {
        WorkflowHealth::Running
    } else {
        WorkflowHealth::Stale
    }
}

/// Resolve the full `WorkflowStatus` the decision function needs, applying
/// the ordering rule: a dead process whose journal classifies as
/// `completed` or `waiting_for_input` is reported as that, never `failed`.
/// Returns `None` when no PIDs are recorded at all (`Unknown`) — the
/// caller has nothing to report a status for.
pub fn resolve_status(
    pids: &WorkflowPids,
    session_path: &Path,
    now: DateTime<Utc>,
    stale_threshold_secs: u64,
) -> Option<(WorkflowStatus, Option<DateTime<Utc>>)> {
    let last_activity_at = mtime(session_path);
    match classify_workflow(pids, session_path, now, stale_threshold_secs) {
        WorkflowHealth::Unknown => None,
        WorkflowHealth::Running | WorkflowHealth::Stale => {
            Some((WorkflowStatus::Running, last_activity_at))
        }
        WorkflowHealth::Dead => {
            let status = match classify_session(session_path, now, stale_threshold_secs) {
                SessionClassification::Completed => WorkflowStatus::Completed,
                SessionClassification::WaitingForInput => WorkflowStatus::WaitingForInput,
                SessionClassification::Running | SessionClassification::Stale => {
                    WorkflowStatus::Failed
                }
            };
            Some((status, last_activity_at))
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
