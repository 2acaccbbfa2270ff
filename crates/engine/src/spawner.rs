//! The workflow spawner (C5, §4.5): race-free subprocess launch guarded by
//! a file-backed intent lock and an active-workflow check, with
//! guaranteed intent cleanup on every exit path.

use chrono::{DateTime, Utc};
use loom_adapters::agent_cli::{AgentCli, SpawnRequest};
use loom_core::batch::BatchStatus;
use loom_core::dashboard_state::LastWorkflow;
use loom_core::id::IdGen;
use loom_core::ids::{OrchestrationId, WorkflowId};
use loom_core::workflow::{WorkflowSnapshot, WorkflowStatus};
use loom_core::OjError;
use loom_storage::{DashboardStateStore, PersistedPids, PidsStore, SpawnIntentStore, WorkflowsLayout};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpawnGuardError {
    #[error("spawn intent already held for this orchestration")]
    IntentHeld,
    #[error("a workflow is already active for this orchestration")]
    WorkflowActive,
}

/// Deletes the spawn-intent file on drop, regardless of which path
/// `spawn_workflow` takes to return — the teacher's scopeguard idiom
/// expressed without the crate, since this is the only call site the
/// workspace needs it at (§4.5 implementation note: "spawn intent file
/// exists for the shortest possible window").
struct IntentGuard<'a> {
    store: &'a SpawnIntentStore,
}

impl Drop for IntentGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.store.delete() {
            tracing::warn!(%err, "failed to delete spawn intent file");
        }
    }
}

/// §4.5 steps 1-6. Returns `Ok(None)` for either guard failure (a live
/// intent already held, or an active workflow already running) rather
/// than an error — both are ordinary outcomes of the race the intent file
/// exists to prevent, not exceptional ones.
#[allow(clippy::too_many_arguments)]
pub async fn spawn_workflow<A: AgentCli>(
    agent_cli: &A,
    id_gen: &dyn IdGen,
    layout: &WorkflowsLayout,
    dashboard_store: &DashboardStateStore,
    orchestration_id: &OrchestrationId,
    skill: &str,
    context: Option<&str>,
    project_root: &Path,
    batch_index: Option<usize>,
    now: DateTime<Utc>,
) -> loom_core::Result<Option<WorkflowSnapshot>> {
    let intent_store = SpawnIntentStore::new(layout, orchestration_id.as_str());

    if !intent_store.try_acquire(skill, orchestration_id.as_str(), now)? {
        return Ok(None);
    }
    let _guard = IntentGuard { store: &intent_store };

    let state = dashboard_store.read()?;
    if let Some(last) = &state.last_workflow {
        if matches!(last.status, WorkflowStatus::Running | WorkflowStatus::WaitingForInput) {
            return Ok(None);
        }
    }

    let workflow_id = WorkflowId::from(id_gen.next());
    let session_log_path = layout.workflow_session(workflow_id.as_str());
    let pids_path = layout.workflow_pids(workflow_id.as_str());

    let request = SpawnRequest {
        skill: skill.to_string(),
        context: context.map(str::to_string),
        project_root: project_root.to_path_buf(),
        session_log_path,
        pids_path,
        env: Vec::new(),
    };

    let outcome = agent_cli
        .spawn(request)
        .await
        .map_err(|e| OjError::Spawn(e.to_string()))?;

    PidsStore::new(layout, workflow_id.as_str()).write(PersistedPids {
        launcher_pid: outcome.launcher_pid,
        agent_pid: outcome.agent_pid,
    })?;

    dashboard_store.update(|state| {
        state.last_workflow = Some(LastWorkflow {
            id: workflow_id.clone(),
            skill: skill.to_string(),
            status: WorkflowStatus::Running,
        });
        if let Some(index) = batch_index {
            if let Some(item) = state.batches.items.get_mut(index) {
                item.workflow_id = Some(workflow_id.clone());
                item.status = BatchStatus::Running;
            }
        }
    })?;

    tracing::info!(
        %workflow_id,
        skill,
        launcher_pid = outcome.launcher_pid,
        agent_pid = outcome.agent_pid,
        "spawned workflow"
    );

    Ok(Some(WorkflowSnapshot {
        id: workflow_id,
        status: WorkflowStatus::Running,
        session_id: None,
        cost_usd: 0.0,
        error: None,
        last_activity_at: Some(now),
        skill: Some(skill.to_string()),
    }))
}

const TERMINATE_GRACE_MS: u64 = 3_000;

/// Shared by pause and cancel: read the persisted PID pair, send a
/// termination signal, wait a short grace period, and escalate to a
/// harder signal if the process is still alive — then remove the PID
/// record (§4.5 "pause / cancel"). `grace_ms` is a parameter so tests
/// don't pay the real grace period.
async fn terminate_workflow_with_grace<A: AgentCli>(
    agent_cli: &A,
    layout: &WorkflowsLayout,
    workflow_id: &WorkflowId,
    grace_ms: u64,
) -> loom_core::Result<()> {
    let pids_store = PidsStore::new(layout, workflow_id.as_str());
    let Some(pids) = pids_store.read()? else {
        return Ok(());
    };

    agent_cli
        .terminate(pids.launcher_pid, pids.agent_pid)
        .await
        .map_err(|e| OjError::Spawn(e.to_string()))?;

    tokio::time::sleep(std::time::Duration::from_millis(grace_ms)).await;

    if loom_adapters::process_exists(pids.launcher_pid) || loom_adapters::process_exists(pids.agent_pid) {
        loom_adapters::process::kill(pids.launcher_pid);
        if pids.agent_pid != pids.launcher_pid {
            loom_adapters::process::kill(pids.agent_pid);
        }
    }

    pids_store.delete()?;
    Ok(())
}

pub async fn pause_workflow<A: AgentCli>(
    agent_cli: &A,
    layout: &WorkflowsLayout,
    workflow_id: &WorkflowId,
) -> loom_core::Result<()> {
    terminate_workflow_with_grace(agent_cli, layout, workflow_id, TERMINATE_GRACE_MS).await
}

pub async fn cancel_workflow<A: AgentCli>(
    agent_cli: &A,
    layout: &WorkflowsLayout,
    workflow_id: &WorkflowId,
) -> loom_core::Result<()> {
    terminate_workflow_with_grace(agent_cli, layout, workflow_id, TERMINATE_GRACE_MS).await
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
