use super::*;
use chrono::Duration;
use loom_core::test_support::{batch_item, batch_tracking, step};
use loom_core::{BatchStatus, OrchestrationConfig, StepName, StepStatus, WorkflowId, WorkflowSnapshot, WorkflowStatus};

fn base_input(now: DateTime<Utc>) -> DecideInput {
    DecideInput {
        active: true,
        step: step(StepName::Design, StepStatus::NotStarted),
        config: OrchestrationConfig::default(),
        batches: BatchTracking::default(),
        workflow: None,
        stored_workflow_id: None,
        now,
        total_cost_usd: 0.0,
        started_at: now,
        lookup_failures: 0,
        has_user_gate: false,
        user_gate_confirmed: false,
    }
}

#[test]
fn inactive_orchestration_idles() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.active = false;
    assert_eq!(decide(&input).action, Action::Idle);
}

#[test]
fn budget_exceeded_fails() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.config.budget.max_total = 5.0;
    input.total_cost_usd = 5.01;
    let decision = decide(&input);
    assert_eq!(decision.action, Action::Fail);
    assert!(decision.reason.contains("5.01"));
}

#[test]
fn wall_clock_cap_needs_attention() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.started_at = now - Duration::seconds(input.config.wall_clock_cap_secs as i64 + 1);
    let decision = decide(&input);
    assert_eq!(decision.action, Action::NeedsAttention);
    assert_eq!(
        decision.recovery_options,
        Some(recovery_options_for(RecoveryCause::DurationExceeded))
    );
}

#[test]
fn design_not_started_spawns() {
    let now = Utc::now();
    let input = base_input(now);
    let decision = decide(&input);
    assert_eq!(decision.action, Action::Spawn);
    assert_eq!(decision.skill.as_deref(), Some("flow.design"));
}

#[test]
fn implement_with_no_batches_initializes() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Implement, StepStatus::InProgress);
    let decision = decide(&input);
    assert_eq!(decision.action, Action::InitializeBatches);
}

#[test]
fn pending_batch_with_no_workflow_spawns() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Implement, StepStatus::InProgress);
    input.batches = batch_tracking(vec![batch_item(0, "Core", &["T001", "T002"], BatchStatus::Pending)]);
    let decision = decide(&input);
    assert_eq!(decision.action, Action::Spawn);
    assert_eq!(decision.skill.as_deref(), Some("flow.implement"));
    assert!(decision.context.as_deref().unwrap().contains("Core"));
}

#[test]
fn running_batch_with_completed_workflow_advances() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Implement, StepStatus::InProgress);
    input.batches = batch_tracking(vec![
        batch_item(0, "Core", &["T001"], BatchStatus::Running),
        batch_item(1, "Misc", &["T002"], BatchStatus::Pending),
    ]);
    input.workflow = Some(WorkflowSnapshot {
        id: WorkflowId::new("wf-1"),
        status: WorkflowStatus::Completed,
        session_id: None,
        cost_usd: 0.0,
        error: None,
        last_activity_at: None,
        skill: Some("flow.implement".into()),
    });
    let decision = decide(&input);
    assert_eq!(decision.action, Action::AdvanceBatch);
    assert_eq!(decision.batch_index, Some(0));
}

#[test]
fn all_batches_done_but_step_not_complete_forces_completion() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Implement, StepStatus::InProgress);
    input.batches = batch_tracking(vec![batch_item(0, "Core", &["T001"], BatchStatus::Completed)]);
    assert_eq!(decide(&input).action, Action::ForceStepComplete);
}

#[test]
fn all_batches_done_and_step_complete_transitions_to_verify() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Implement, StepStatus::Complete);
    input.batches = batch_tracking(vec![batch_item(0, "Core", &["T001"], BatchStatus::Completed)]);
    let decision = decide(&input);
    assert_eq!(decision.action, Action::Transition);
    assert_eq!(decision.next_step, Some(StepName::Verify));
}

#[test]
fn batch_failure_heals_while_budget_remains() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Implement, StepStatus::InProgress);
    input.batches = batch_tracking(vec![batch_item(0, "Core", &["T001"], BatchStatus::Failed)]);
    let decision = decide(&input);
    assert_eq!(decision.action, Action::HealBatch);
    assert_eq!(decision.batch_index, Some(0));
}

#[test]
fn batch_failure_recovers_once_heal_attempts_exhausted() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Implement, StepStatus::InProgress);
    let mut item = batch_item(0, "Core", &["T001"], BatchStatus::Failed);
    item.heal_attempts = input.config.max_heal_attempts;
    input.batches = batch_tracking(vec![item]);
    let decision = decide(&input);
    assert_eq!(decision.action, Action::RecoverFailed);
    assert_eq!(
        decision.recovery_options,
        Some(recovery_options_for(RecoveryCause::HealExhausted))
    );
}

#[test]
fn running_workflow_waits() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Verify, StepStatus::InProgress);
    input.workflow = Some(WorkflowSnapshot {
        id: WorkflowId::new("wf-1"),
        status: WorkflowStatus::Running,
        session_id: None,
        cost_usd: 0.0,
        error: None,
        last_activity_at: Some(now),
        skill: Some("flow.verify".into()),
    });
    assert_eq!(decide(&input).action, Action::Wait);
}

#[test]
fn stale_running_workflow_recovers() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Verify, StepStatus::InProgress);
    input.workflow = Some(WorkflowSnapshot {
        id: WorkflowId::new("wf-1"),
        status: WorkflowStatus::Running,
        session_id: None,
        cost_usd: 0.0,
        error: None,
        last_activity_at: Some(now - Duration::seconds(input.config.stale_threshold_secs as i64 + 1)),
        skill: Some("flow.verify".into()),
    });
    let decision = decide(&input);
    assert_eq!(decision.action, Action::RecoverStale);
}

#[test]
fn lookup_failure_backs_off() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Verify, StepStatus::InProgress);
    input.stored_workflow_id = Some(WorkflowId::new("wf-1"));
    input.lookup_failures = 3;
    let decision = decide(&input);
    assert_eq!(decision.action, Action::WaitWithBackoff);
    assert_eq!(decision.backoff_ms, Some(8_000));
}

#[test]
fn verify_complete_without_auto_merge_waits_for_merge_confirmation() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Verify, StepStatus::Complete);
    assert_eq!(decide(&input).action, Action::WaitMerge);
}

#[test]
fn verify_complete_with_auto_merge_transitions() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Verify, StepStatus::Complete);
    input.config.auto_merge = true;
    let decision = decide(&input);
    assert_eq!(decision.action, Action::Transition);
    assert_eq!(decision.next_step, Some(StepName::Merge));
}

#[test]
fn user_gate_blocks_merge_until_confirmed() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Verify, StepStatus::Complete);
    input.config.auto_merge = true;
    input.has_user_gate = true;
    assert_eq!(decide(&input).action, Action::WaitUserGate);

    input.user_gate_confirmed = true;
    let decision = decide(&input);
    assert_eq!(decision.action, Action::Transition);
    assert_eq!(decision.next_step, Some(StepName::Merge));
}

#[test]
fn merge_complete_finishes_pipeline() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Merge, StepStatus::Complete);
    assert_eq!(decide(&input).action, Action::Complete);
}

#[test]
fn step_failed_recovers() {
    let now = Utc::now();
    let mut input = base_input(now);
    input.step = step(StepName::Analyze, StepStatus::Failed);
    let decision = decide(&input);
    assert_eq!(decision.action, Action::RecoverFailed);
    assert_eq!(
        decision.recovery_options,
        Some(recovery_options_for(RecoveryCause::StepFailedOrBlocked))
    );
}

#[test]
fn same_input_decides_identically() {
    let now = Utc::now();
    let input = base_input(now);
    assert_eq!(decide(&input).action, decide(&input).action);
}
