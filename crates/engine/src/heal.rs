//! The auto-heal coordinator (C7, §4.7): two entry points the runner loop
//! calls — reconciling a just-terminated workflow against step state, and
//! invoking the heal routine when a batch fails outright.

use loom_adapters::heal::{HealOutcome, HealRequest, HealResultStatus, HealRoutine};
use loom_adapters::step_setter::StepSetter;
use loom_core::batch::BatchStatus;
use loom_core::step::{StepName, StepStatus};
use loom_core::OjError;
use loom_storage::DashboardStateStore;
use std::path::Path;

fn expected_step_for_skill(skill: &str) -> Option<StepName> {
    match skill {
        "flow.design" => Some(StepName::Design),
        "flow.analyze" => Some(StepName::Analyze),
        "flow.implement" => Some(StepName::Implement),
        "flow.verify" => Some(StepName::Verify),
        "flow.merge" => Some(StepName::Merge),
        _ => None,
    }
}

/// What `apply_post_workflow_reconciliation` decided, for the caller's logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealDispatchOutcome {
    /// `step.current` matched the completed skill's phase; status synced
    /// (or already in sync — this is idempotent).
    Reconciled,
    /// The completed skill's phase no longer matches `step.current` (a
    /// stale workflow from a superseded runner generation, most likely).
    /// No write happened.
    Skipped,
}

/// §4.7(a): given the skill that just finished and whether it succeeded,
/// sync `step.status` with the terminal outcome — but only when
/// `step.current` still names the same phase that skill belongs to. Never
/// forces a step transition for a workflow the orchestration has already
/// moved past.
pub async fn apply_post_workflow_reconciliation<S: StepSetter>(
    step_setter: &S,
    project_root: &Path,
    current_step: StepName,
    current_status: StepStatus,
    completed_skill: &str,
    completed_successfully: bool,
) -> loom_core::Result<HealDispatchOutcome> {
    let Some(expected) = expected_step_for_skill(completed_skill) else {
        return Ok(HealDispatchOutcome::Skipped);
    };

    if expected != current_step {
        tracing::info!(
            completed_skill,
            ?expected,
            ?current_step,
            "post-workflow reconciliation: step moved on, skipping"
        );
        return Ok(HealDispatchOutcome::Skipped);
    }

    let target_status = if completed_successfully {
        StepStatus::Complete
    } else {
        StepStatus::Failed
    };

    if current_status == target_status {
        return Ok(HealDispatchOutcome::Reconciled);
    }

    step_setter
        .set_step(
            &project_root.to_path_buf(),
            current_step,
            target_status,
            current_step.index(),
        )
        .await
        .map_err(|e| OjError::StepSetter(e.to_string()))?;

    Ok(HealDispatchOutcome::Reconciled)
}

/// §4.7(b): invoke the external heal routine for the current batch and
/// fold its outcome into `DashboardState.batches`. Mirrors the batch
/// sub-matrix's own bookkeeping: `fixed` settles the batch as `healed`
/// (and advances `current` unless this was the last one — the runner's
/// next `decide()` call handles that via `advance_batch`'s usual path, so
/// this only flips the per-item status); anything else increments
/// `heal_attempts` and leaves the item `failed`. Exhausting
/// `config.max_heal_attempts` does *not* fail the orchestration here —
/// the batch sub-matrix's own gate (`decision.rs`) sees `heal_attempts ≥
/// max` on the next tick and emits `recover_failed`, which the runner
/// turns into `needs_attention` with `{retry, skip, abort}` (§8 scenario
/// 3, recovery table in SPEC_FULL).
pub async fn run_batch_heal<H: HealRoutine>(
    heal_routine: &H,
    dashboard_store: &DashboardStateStore,
    project_root: &Path,
    batch_index: usize,
) -> loom_core::Result<HealOutcome> {
    let state = dashboard_store.read()?;
    let Some(item) = state.batches.items.get(batch_index) else {
        return Err(OjError::Heal(format!(
            "no batch item at index {batch_index} to heal"
        )));
    };

    let request = HealRequest {
        section: item.section.clone(),
        task_ids: item.task_ids.clone(),
        previous_workflow_id: item.workflow_id.as_ref().map(|id| id.to_string()),
        session_id: None,
        healing_budget_usd: Some(state.active.as_ref().map_or(0.0, |a| a.config.budget.healing_budget)),
        project_root: project_root.to_path_buf(),
    };

    let outcome = heal_routine.heal(request).await;

    dashboard_store.update(|state| {
        state.cost.add(outcome.cost_usd);
        let Some(item) = state.batches.items.get_mut(batch_index) else {
            return;
        };

        if outcome.success && outcome.result_status == HealResultStatus::Fixed {
            item.status = BatchStatus::Healed;
            item.healer_execution_id = outcome.session_id.clone();
        } else {
            item.heal_attempts += 1;
            item.status = BatchStatus::Failed;
        }
    })?;

    Ok(outcome)
}

#[cfg(test)]
#[path = "heal_tests.rs"]
mod tests;
