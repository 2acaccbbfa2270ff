//! The runner loop (C6, §4.6): one async task per orchestration that reads
//! state, asks the pure decision function for the next action, and
//! dispatches it — woken early by file events, falling back to a fixed
//! polling interval. Mirrors the teacher's one-task-per-subsystem shape
//! (`runtime/mod.rs`'s worker/cron tasks communicating through an
//! `mpsc::Sender` and a `parking_lot::Mutex`-guarded shared map),
//! generalized to one task per orchestration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use loom_adapters::agent_cli::AgentCli;
use loom_adapters::health::{resolve_status, WorkflowPids};
use loom_adapters::heal::HealRoutine;
use loom_adapters::notify_watch::{watch_project_paths, FileEvent, FileEventSubscriber};
use loom_adapters::step_setter::StepSetter;
use loom_core::batch::{BatchItem, BatchStatus};
use loom_core::config::OrchestrationConfig;
use loom_core::dashboard_state::{LastWorkflow, OrchestrationStatus, RecoveryContext};
use loom_core::decision::{Action, Decision};
use loom_core::id::IdGen;
use loom_core::ids::{OrchestrationId, WorkflowId};
use loom_core::step::{Step, StepStatus};
use loom_core::workflow::{WorkflowSnapshot, WorkflowStatus};
use loom_core::{BatchTracking, OjError};
use loom_storage::{DashboardStateStore, PidsStore, RunnerMarkerStore, StepStateStore, WorkflowsLayout};

use crate::decision::{decide, DecideInput};
use crate::heal::{apply_post_workflow_reconciliation, run_batch_heal};
use crate::planner::plan_batches;
use crate::registry::RunnerRegistry;
use crate::spawner::spawn_workflow;

/// §4.6: "sleep `pollingInterval` (default 5 s)".
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// §4.6: loop bound so a wedged runner can't spin forever.
const MAX_POLLING_ATTEMPTS: u32 = 500;
/// The project-root file `initialize_batches` parses. Not named anywhere
/// in the external-interfaces file layout (§6 only describes
/// `.state/workflows/`), so this is a project-root convention alongside
/// it rather than a configurable path — see DESIGN.md.
const TASKS_DOCUMENT_FILENAME: &str = "TASKS.md";

/// Everything one orchestration's runner task needs, bundled so `run`/
/// `run_once` take one argument instead of a dozen. Generic over the three
/// external-collaborator traits (agent CLI, step setter, heal routine) the
/// same way the rest of `loom-engine` is, so production code monomorphizes
/// to the `Real*` adapters and tests monomorphize to the `Fake*` ones with
/// no trait-object indirection in either case.
#[derive(Clone)]
pub struct RunnerHandles<A, S, H>
where
    A: AgentCli,
    S: StepSetter,
    H: HealRoutine,
{
    pub agent_cli: Arc<A>,
    pub step_setter: Arc<S>,
    pub heal_routine: Arc<H>,
    pub id_gen: Arc<dyn IdGen>,
    pub layout: WorkflowsLayout,
    pub dashboard_store: DashboardStateStore,
    pub step_store: StepStateStore,
    pub registry: RunnerRegistry,
    pub project_root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOnceOutcome {
    /// `DashboardState.active` is absent, or names a different
    /// orchestration — this runner's work is done.
    NotOwned,
    /// A newer runner generation has taken over; exit without cleanup.
    Superseded,
    /// `active.status` already settled into a terminal state.
    Terminal,
    /// `active.status ∈ {needs_attention, paused, waiting_merge}` — sleep
    /// the doubled interval instead of dispatching anything.
    Quiesced,
    /// An ordinary iteration: state was read, a decision dispatched.
    Continued,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOnceResult {
    pub outcome: RunOnceOutcome,
    /// Carried into the next call's `lookup_failures` argument.
    pub lookup_failures: u32,
}

/// Resolve the workflow snapshot the decision function should see this
/// iteration (§4.6 "resolve the current workflow snapshot"): `lastWorkflow`
/// only counts if its skill still matches the phase currently in flight —
/// otherwise the step has moved on and there is nothing to report. Returns
/// `(None, Some(id))` when a workflow is named but its PID/session record
/// can't be resolved, which `decide()` treats as a transient lookup
/// failure (§4.4, §7 taxonomy item 4).
fn resolve_workflow_snapshot(
    layout: &WorkflowsLayout,
    stored: Option<&LastWorkflow>,
    expected_skill: Option<&str>,
    stale_threshold_secs: u64,
    now: DateTime<Utc>,
) -> loom_core::Result<(Option<WorkflowSnapshot>, Option<WorkflowId>)> {
    let Some(last) = stored else {
        return Ok((None, None));
    };
    if Some(last.skill.as_str()) != expected_skill {
        return Ok((None, None));
    }

    let Some(persisted) = PidsStore::new(layout, last.id.as_str()).read()? else {
        return Ok((None, Some(last.id.clone())));
    };

    let pids = WorkflowPids {
        launcher_pid: Some(persisted.launcher_pid),
        agent_pid: Some(persisted.agent_pid),
    };
    let session_path = layout.workflow_session(last.id.as_str());
    let Some((status, last_activity_at)) = resolve_status(&pids, &session_path, now, stale_threshold_secs) else {
        return Ok((None, Some(last.id.clone())));
    };

    Ok((
        Some(WorkflowSnapshot {
            id: last.id.clone(),
            status,
            session_id: None,
            cost_usd: 0.0,
            error: None,
            last_activity_at,
            skill: Some(last.skill.clone()),
        }),
        None,
    ))
}

/// One pass of the runner loop's body (§4.6 step 3): generation check,
/// read, resolve, reconcile, decide, log, dispatch. Exposed separately
/// from [`run`] so tests can drive individual iterations deterministically
/// without sleeping.
pub async fn run_once<A, S, H>(
    handles: &RunnerHandles<A, S, H>,
    orchestration_id: &OrchestrationId,
    generation: u64,
    lookup_failures: u32,
    now: DateTime<Utc>,
) -> loom_core::Result<RunOnceResult>
where
    A: AgentCli,
    S: StepSetter,
    H: HealRoutine,
{
    let quiesced = |lookup_failures| RunOnceResult {
        outcome: RunOnceOutcome::Quiesced,
        lookup_failures,
    };

    if !handles.registry.is_current(orchestration_id, generation) {
        return Ok(RunOnceResult {
            outcome: RunOnceOutcome::Superseded,
            lookup_failures,
        });
    }

    let state = handles.dashboard_store.read()?;
    let Some(active) = state.active.as_ref() else {
        return Ok(RunOnceResult {
            outcome: RunOnceOutcome::NotOwned,
            lookup_failures,
        });
    };
    if active.id != *orchestration_id {
        return Ok(RunOnceResult {
            outcome: RunOnceOutcome::NotOwned,
            lookup_failures,
        });
    }
    if active.status.is_terminal() {
        return Ok(RunOnceResult {
            outcome: RunOnceOutcome::Terminal,
            lookup_failures,
        });
    }
    if matches!(
        active.status,
        OrchestrationStatus::NeedsAttention | OrchestrationStatus::Paused | OrchestrationStatus::WaitingMerge
    ) {
        return Ok(quiesced(lookup_failures));
    }

    let config = active.config.clone();
    let started_at = active.started_at;
    let total_cost_usd = state.cost.total;
    let step = handles.step_store.read()?;

    let (workflow_snapshot, stored_workflow_id) = resolve_workflow_snapshot(
        &handles.layout,
        state.last_workflow.as_ref(),
        step.current.skill(),
        config.stale_threshold_secs,
        now,
    )?;

    if let (Some(prev), Some(current)) = (&state.last_workflow, &workflow_snapshot) {
        if prev.status == WorkflowStatus::Running && current.is_terminal() {
            let outcome = apply_post_workflow_reconciliation(
                handles.step_setter.as_ref(),
                &handles.project_root,
                step.current,
                step.status,
                &prev.skill,
                current.status == WorkflowStatus::Completed,
            )
            .await?;
            tracing::debug!(?outcome, skill = %prev.skill, "post-workflow reconciliation");

            handles.dashboard_store.update(|state| {
                if let Some(last) = state.last_workflow.as_mut() {
                    last.status = current.status;
                }
            })?;
        }
    }

    let next_lookup_failures = if workflow_snapshot.is_none() && stored_workflow_id.is_some() {
        lookup_failures.saturating_add(1)
    } else {
        0
    };

    let input = DecideInput {
        active: true,
        step,
        config: config.clone(),
        batches: state.batches.clone(),
        workflow: workflow_snapshot,
        stored_workflow_id,
        now,
        total_cost_usd,
        started_at,
        lookup_failures,
        has_user_gate: config.require_merge_gate,
        user_gate_confirmed: state.user_gate_confirmed,
    };

    let decision = decide(&input);

    if decision.is_loggable() {
        handles
            .dashboard_store
            .append_decision(&format!("{:?}", decision.action), &decision.reason)?;
    }

    execute_decision(handles, orchestration_id, &step, &decision, &config, now).await?;

    Ok(RunOnceResult {
        outcome: RunOnceOutcome::Continued,
        lookup_failures: next_lookup_failures,
    })
}

/// The dispatch table (§4.6 "Dispatch table"): one arm per [`Action`].
async fn execute_decision<A, S, H>(
    handles: &RunnerHandles<A, S, H>,
    orchestration_id: &OrchestrationId,
    step: &Step,
    decision: &Decision,
    config: &OrchestrationConfig,
    now: DateTime<Utc>,
) -> loom_core::Result<()>
where
    A: AgentCli,
    S: StepSetter,
    H: HealRoutine,
{
    match decision.action {
        Action::Idle | Action::Wait | Action::WaitWithBackoff => {}

        Action::WaitUserGate | Action::WaitMerge => {
            handles.dashboard_store.update(|state| {
                if let Some(active) = state.active.as_mut() {
                    active.status = OrchestrationStatus::WaitingMerge;
                }
            })?;
        }

        Action::Spawn => {
            spawn_workflow(
                handles.agent_cli.as_ref(),
                handles.id_gen.as_ref(),
                &handles.layout,
                &handles.dashboard_store,
                orchestration_id,
                decision.skill.as_deref().unwrap_or_default(),
                decision.context.as_deref(),
                &handles.project_root,
                decision.batch_index,
                now,
            )
            .await?;
        }

        Action::Transition => {
            if let Some(next) = decision.next_step {
                // §3 config fields `skip*`: a skipped phase never spawns a
                // workflow. Landing it in `Skipped` rather than
                // `NotStarted` routes the *next* iteration straight through
                // the step-completion sub-matrix's `Skipped` arm, which
                // transitions onward without calling `spawn_for_current_step`.
                let status = if config.skips(next) {
                    StepStatus::Skipped
                } else {
                    StepStatus::NotStarted
                };
                handles
                    .step_setter
                    .set_step(&handles.project_root, next, status, next.index())
                    .await
                    .map_err(|e| OjError::StepSetter(e.to_string()))?;
            }
        }

        Action::AdvanceBatch => {
            handles.dashboard_store.update(|state| {
                if let Some(index) = decision.batch_index {
                    if let Some(item) = state.batches.items.get_mut(index) {
                        if item.status == BatchStatus::Running {
                            item.status = BatchStatus::Completed;
                        }
                    }
                }
                if state.batches.total > 0 {
                    state.batches.current = (state.batches.current + 1).min(state.batches.total - 1);
                }
                if decision.pause_after_advance == Some(true) {
                    if let Some(active) = state.active.as_mut() {
                        active.status = OrchestrationStatus::Paused;
                    }
                }
            })?;
        }

        Action::InitializeBatches => {
            let document = tokio::fs::read_to_string(handles.project_root.join(TASKS_DOCUMENT_FILENAME))
                .await
                .unwrap_or_default();
            let plan = plan_batches(&document, config.batch_size_fallback);
            for warning in &plan.dependency_warnings {
                tracing::warn!(warning, "batch dependency warning");
            }
            let items: Vec<BatchItem> = plan
                .batches
                .iter()
                .enumerate()
                .map(|(index, batch)| BatchItem::new(index, batch.name.clone(), batch.task_ids.clone()))
                .collect();
            let total = items.len();
            handles.dashboard_store.update(|state| {
                state.batches = BatchTracking {
                    total,
                    current: 0,
                    items: items.clone(),
                };
            })?;
        }

        Action::HealBatch => {
            if let Some(index) = decision.batch_index {
                run_batch_heal(
                    handles.heal_routine.as_ref(),
                    &handles.dashboard_store,
                    &handles.project_root,
                    index,
                )
                .await?;
            }
        }

        Action::ForceStepComplete => {
            handles
                .step_setter
                .set_step(&handles.project_root, step.current, StepStatus::Complete, step.current.index())
                .await
                .map_err(|e| OjError::StepSetter(e.to_string()))?;
        }

        Action::Pause => {
            handles.dashboard_store.update(|state| {
                if let Some(active) = state.active.as_mut() {
                    active.status = OrchestrationStatus::Paused;
                }
            })?;
        }

        Action::RecoverStale | Action::RecoverFailed | Action::NeedsAttention => {
            handles.dashboard_store.update(|state| {
                if let Some(active) = state.active.as_mut() {
                    active.status = OrchestrationStatus::NeedsAttention;
                }
                state.recovery_context = Some(RecoveryContext {
                    issue: decision.reason.clone(),
                    options: decision.recovery_options.clone().unwrap_or_default(),
                    failed_workflow_id: state.last_workflow.as_ref().map(|w| w.id.clone()),
                });
            })?;
        }

        Action::Fail => {
            tracing::error!(reason = %decision.reason, "orchestration failed");
            handles.dashboard_store.update(|state| {
                if let Some(active) = state.active.as_mut() {
                    active.status = OrchestrationStatus::Failed;
                }
            })?;
        }

        Action::Complete => {
            handles.dashboard_store.update(|state| {
                if let Some(active) = state.active.as_mut() {
                    active.status = OrchestrationStatus::Completed;
                }
            })?;
        }
    }
    Ok(())
}

async fn sleep_with_wake(events: &mut mpsc::Receiver<FileEvent>, duration: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = events.recv() => {}
    }
}

/// The full runner lifecycle (§4.6 "Lifecycle"): register a generation,
/// write the runner marker, subscribe to file events, loop `run_once` with
/// an event-driven sleep, and clean up on exit — unless superseded, in
/// which case the newer runner owns the marker and this task walks away.
pub async fn run<A, S, H>(
    handles: RunnerHandles<A, S, H>,
    orchestration_id: OrchestrationId,
    subscriber: Arc<dyn FileEventSubscriber>,
    project_id: String,
) where
    A: AgentCli,
    S: StepSetter,
    H: HealRoutine,
{
    let generation = handles.registry.start(orchestration_id.clone());
    let marker_store = RunnerMarkerStore::new(handles.layout.clone());

    if let Err(err) = marker_store.write(orchestration_id.as_str(), std::process::id(), Utc::now()) {
        tracing::error!(%err, %orchestration_id, "failed to write runner marker");
        return;
    }

    if let Err(err) = watch_project_paths(
        subscriber.as_ref(),
        &project_id,
        &handles.layout.dashboard_state(),
        &handles.layout.step_state(),
        None,
    ) {
        tracing::warn!(%err, "file-event subscription unavailable, falling back to polling");
    }
    let mut events = subscriber.subscribe(&project_id);

    let mut lookup_failures: u32 = 0;
    let mut attempts: u32 = 0;

    loop {
        if attempts >= MAX_POLLING_ATTEMPTS {
            tracing::warn!(%orchestration_id, "runner hit its polling-attempt ceiling, exiting");
            break;
        }
        attempts += 1;

        let result = match run_once(&handles, &orchestration_id, generation, lookup_failures, Utc::now()).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(%err, %orchestration_id, "runner iteration failed, failing orchestration");
                let _ = handles.dashboard_store.update(|state| {
                    if let Some(active) = state.active.as_mut() {
                        active.status = OrchestrationStatus::Failed;
                    }
                });
                break;
            }
        };
        lookup_failures = result.lookup_failures;

        match result.outcome {
            RunOnceOutcome::Superseded => {
                tracing::info!(%orchestration_id, "superseded by a newer runner, exiting without cleanup");
                return;
            }
            RunOnceOutcome::NotOwned | RunOnceOutcome::Terminal => break,
            RunOnceOutcome::Quiesced => {
                sleep_with_wake(&mut events, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS * 2)).await;
            }
            RunOnceOutcome::Continued => {
                sleep_with_wake(&mut events, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)).await;
            }
        }
    }

    if handles.registry.is_current(&orchestration_id, generation) {
        handles.registry.stop(&orchestration_id);
        if let Err(err) = marker_store.delete(orchestration_id.as_str()) {
            tracing::warn!(%err, %orchestration_id, "failed to delete runner marker on exit");
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
