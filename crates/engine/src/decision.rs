//! The pure decision function (C4, §4.4): maps a snapshot of orchestration
//! state to the single next [`Action`] to take. No I/O, no clock reads
//! beyond `input.now` — every gate below is a total function of its inputs,
//! mirroring the teacher's preference for pure "reducer" style decision
//! functions kept separate from the effectful loop that calls them (see
//! `loom_core::decision` for the `Decision` shape itself).

use chrono::{DateTime, Utc};
use loom_core::batch::BatchStatus;
use loom_core::config::OrchestrationConfig;
use loom_core::decision::{Action, Decision};
use loom_core::recovery::{recovery_options_for, RecoveryCause};
use loom_core::step::{Step, StepName, StepStatus};
use loom_core::workflow::{WorkflowSnapshot, WorkflowStatus};
use loom_core::{BatchTracking, WorkflowId};

/// Exponential backoff for the "stored workflow id but lookup came back
/// empty" bullet of the workflow sub-matrix: `1s · 2^failures`, capped.
const DEFAULT_LOOKUP_BACKOFF_BASE_MS: u64 = 1_000;
const DEFAULT_LOOKUP_BACKOFF_CAP_MS: u64 = 30_000;

/// Everything `decide` needs, gathered by the runner loop before each call.
///
/// The literal input shape sketched in §4.4 (`active, step, config, batches,
/// workflow, now, totalCostUsd, startedAt, lookupFailures`) is silent on two
/// things the step-completion sub-matrix and the lookup-failure bullet both
/// depend on: whether a stored workflow id exists when `workflow` itself
/// resolved to nothing (needed to distinguish "never spawned" from "spawned,
/// then lookup failed"), and the user-gate state referenced in scenario 6
/// (`phase.hasUserGate`, `userGateStatus`). Both are added as explicit fields
/// here rather than guessed into `config` or `workflow`; see DESIGN.md.
#[derive(Debug, Clone)]
pub struct DecideInput {
    pub active: bool,
    pub step: Step,
    pub config: OrchestrationConfig,
    pub batches: BatchTracking,
    pub workflow: Option<WorkflowSnapshot>,
    /// Set when `DashboardState.last_workflow` names an id but the health
    /// supervisor's lookup for it came back empty this tick.
    pub stored_workflow_id: Option<WorkflowId>,
    pub now: DateTime<Utc>,
    pub total_cost_usd: f64,
    pub started_at: DateTime<Utc>,
    pub lookup_failures: u32,
    /// Whether the current phase carries a user-confirmation checkpoint
    /// (only meaningful for the `verify` → `merge` transition).
    pub has_user_gate: bool,
    pub user_gate_confirmed: bool,
}

fn lookup_backoff_ms(failures: u32) -> u64 {
    let scaled = DEFAULT_LOOKUP_BACKOFF_BASE_MS.saturating_mul(1u64 << failures.min(5));
    scaled.min(DEFAULT_LOOKUP_BACKOFF_CAP_MS)
}

fn is_stale(workflow: &WorkflowSnapshot, now: DateTime<Utc>, stale_threshold_secs: u64) -> bool {
    match workflow.last_activity_at {
        Some(last) => (now - last).num_seconds() > stale_threshold_secs as i64,
        None => false,
    }
}

fn heal_budget_remaining(config: &OrchestrationConfig, heal_attempts: u32) -> bool {
    config.auto_heal_enabled && heal_attempts < config.max_heal_attempts
}

fn implement_heal_task_context(section: &str, task_ids: &[String], additional: &str) -> String {
    let ids = task_ids.join(", ");
    let mut ctx = format!(
        "Execute only the \"{section}\" section ({ids}). Do NOT work on tasks from other sections."
    );
    if !additional.is_empty() {
        ctx.push_str("\n\n");
        ctx.push_str(additional);
    }
    ctx
}

/// The batch sub-matrix (§4.4, only consulted when `step.current = implement`).
///
/// `None` means "no verdict here, fall through to the outer workflow/step
/// matrices" — used for the `allDone && complete` case and (pragmatically)
/// whenever the current batch is mid-flight and its workflow hasn't reached
/// a state this sub-matrix recognizes.
fn batch_submatrix(input: &DecideInput) -> Option<Decision> {
    let batches = &input.batches;

    if batches.total == 0 {
        return Some(
            Decision::new(Action::InitializeBatches, "implement phase has no batches yet")
                .with_skill("flow.implement"),
        );
    }

    if batches.all_done() {
        if input.step.status != StepStatus::Complete {
            return Some(Decision::new(
                Action::ForceStepComplete,
                "all batches completed or healed",
            ));
        }
        return None;
    }

    let b = batches.current_item()?;
    let is_last = batches.is_last();

    match b.status {
        BatchStatus::Running => match &input.workflow {
            Some(wf) => match wf.status {
                WorkflowStatus::Running => None,
                WorkflowStatus::WaitingForInput => None,
                WorkflowStatus::Completed => Some(
                    Decision::new(Action::AdvanceBatch, "batch workflow completed")
                        .with_batch_index(batches.current)
                        .with_pause_after_advance(input.config.pause_between_batches && !is_last),
                ),
                // Not spelled out as its own bullet in the batch sub-matrix
                // (only the `b.status = failed` case is), but leaving a
                // workflow-level failure to fall through to "otherwise ->
                // wait" would spin forever on a batch whose workflow already
                // died. Route it through the same heal/recover-failed gate
                // the explicit `b.status = failed` branch below uses.
                WorkflowStatus::Failed => {
                    if heal_budget_remaining(&input.config, b.heal_attempts) {
                        Some(
                            Decision::new(Action::HealBatch, "batch workflow failed")
                                .with_batch_index(batches.current),
                        )
                    } else {
                        Some(
                            Decision::new(Action::RecoverFailed, "heal attempts exhausted")
                                .with_batch_index(batches.current)
                                .with_recovery_options(recovery_options_for(
                                    RecoveryCause::HealExhausted,
                                )),
                        )
                    }
                }
                WorkflowStatus::Cancelled => Some(
                    Decision::new(Action::NeedsAttention, "batch workflow cancelled")
                        .with_batch_index(batches.current)
                        .with_recovery_options(recovery_options_for(
                            RecoveryCause::WorkflowCancelled,
                        )),
                ),
            },
            None => None,
        },
        BatchStatus::Completed | BatchStatus::Healed => Some(
            Decision::new(Action::AdvanceBatch, "batch settled")
                .with_batch_index(batches.current)
                .with_pause_after_advance(input.config.pause_between_batches && !is_last),
        ),
        BatchStatus::Pending => match &input.workflow {
            None => Some(
                Decision::new(Action::Spawn, "starting next batch")
                    .with_skill("flow.implement")
                    .with_context(implement_heal_task_context(
                        &b.section,
                        &b.task_ids,
                        &input.config.additional_context,
                    )),
            ),
            Some(_) => None,
        },
        BatchStatus::Failed => {
            if heal_budget_remaining(&input.config, b.heal_attempts) {
                Some(
                    Decision::new(Action::HealBatch, "batch failed")
                        .with_batch_index(batches.current),
                )
            } else {
                Some(
                    Decision::new(Action::RecoverFailed, "heal attempts exhausted")
                        .with_batch_index(batches.current)
                        .with_recovery_options(recovery_options_for(RecoveryCause::HealExhausted)),
                )
            }
        }
    }
}

/// The workflow-state sub-matrix (§4.4 gate 5), applied regardless of
/// `step.current`.
fn workflow_submatrix(input: &DecideInput) -> Option<Decision> {
    if let Some(wf) = &input.workflow {
        return Some(match wf.status {
            WorkflowStatus::Running => {
                if is_stale(wf, input.now, input.config.stale_threshold_secs) {
                    Decision::new(Action::RecoverStale, "workflow stale")
                        .with_recovery_options(recovery_options_for(RecoveryCause::StaleWorkflow))
                } else {
                    Decision::new(Action::Wait, "workflow running")
                }
            }
            WorkflowStatus::WaitingForInput => Decision::new(Action::Wait, "waiting for input"),
            WorkflowStatus::Failed => {
                if input.step.current == StepName::Implement
                    && input
                        .batches
                        .current_item()
                        .is_some_and(|b| heal_budget_remaining(&input.config, b.heal_attempts))
                {
                    Decision::new(Action::HealBatch, "workflow failed")
                        .with_batch_index(input.batches.current)
                } else {
                    Decision::new(Action::NeedsAttention, "workflow failed")
                        .with_recovery_options(recovery_options_for(RecoveryCause::WorkflowFailed))
                }
            }
            WorkflowStatus::Cancelled => Decision::new(Action::NeedsAttention, "workflow cancelled")
                .with_recovery_options(recovery_options_for(RecoveryCause::WorkflowCancelled)),
            WorkflowStatus::Completed if input.step.current != StepName::Implement => return None,
            WorkflowStatus::Completed => Decision::new(Action::Wait, "batch workflow completed"),
        });
    }

    if input.stored_workflow_id.is_some() {
        return Some(
            Decision::new(Action::WaitWithBackoff, "workflow lookup failed")
                .with_backoff_ms(lookup_backoff_ms(input.lookup_failures)),
        );
    }

    None
}

/// The step-completion sub-matrix (§4.4 gate 6).
fn step_completion_submatrix(input: &DecideInput) -> Decision {
    let step = &input.step;

    match step.status {
        StepStatus::Complete => match step.current.next() {
            None => Decision::new(Action::Complete, "pipeline complete"),
            Some(StepName::Merge) => {
                if input.has_user_gate && !input.user_gate_confirmed {
                    Decision::new(Action::WaitUserGate, "merge gate not confirmed")
                } else if !input.config.auto_merge {
                    Decision::new(Action::WaitMerge, "auto-merge disabled")
                } else {
                    Decision::new(Action::Transition, "advancing to merge")
                        .with_next_step(StepName::Merge)
                }
            }
            Some(next) => Decision::new(Action::Transition, format!("advancing to {next:?}"))
                .with_next_step(next),
        },
        StepStatus::Failed | StepStatus::Blocked => {
            Decision::new(Action::RecoverFailed, "step failed or blocked").with_recovery_options(
                recovery_options_for(RecoveryCause::StepFailedOrBlocked),
            )
        }
        StepStatus::InProgress => match &input.workflow {
            None => spawn_for_current_step(input),
            Some(_) => Decision::new(Action::Wait, "workflow in progress"),
        },
        StepStatus::NotStarted | StepStatus::Pending => {
            if step.current == StepName::Implement && input.batches.total == 0 {
                Decision::new(Action::InitializeBatches, "implement phase starting")
                    .with_skill("flow.implement")
            } else {
                spawn_for_current_step(input)
            }
        }
        StepStatus::Skipped => match step.current.next() {
            Some(next) => {
                Decision::new(Action::Transition, "step skipped").with_next_step(next)
            }
            None => Decision::new(Action::Complete, "pipeline complete"),
        },
    }
}

fn spawn_for_current_step(input: &DecideInput) -> Decision {
    match input.step.current.skill() {
        Some(skill) => {
            let mut decision = Decision::new(Action::Spawn, format!("starting {skill}"))
                .with_skill(skill);
            if !input.config.additional_context.is_empty() {
                decision = decision.with_context(input.config.additional_context.clone());
            }
            decision
        }
        None => Decision::new(Action::Complete, "pipeline complete"),
    }
}

/// The full gated decision matrix (§4.4). First match wins.
pub fn decide(input: &DecideInput) -> Decision {
    if !input.active {
        return Decision::new(Action::Idle, "no active orchestration");
    }

    if input.total_cost_usd >= input.config.budget.max_total {
        return Decision::new(
            Action::Fail,
            format!(
                "Budget exceeded: ${:.2} \u{2265} ${:.2}",
                input.total_cost_usd, input.config.budget.max_total
            ),
        );
    }

    if (input.now - input.started_at).num_seconds() > input.config.wall_clock_cap_secs as i64 {
        return Decision::new(Action::NeedsAttention, "orchestration wall clock exceeded")
            .with_recovery_options(recovery_options_for(RecoveryCause::DurationExceeded));
    }

    if input.step.current == StepName::Implement {
        if let Some(decision) = batch_submatrix(input) {
            return decision;
        }
    }

    if let Some(decision) = workflow_submatrix(input) {
        return decision;
    }

    step_completion_submatrix(input)
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
