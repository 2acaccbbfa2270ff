use super::*;
use chrono::Utc;
use loom_adapters::FakeAgentCli;
use loom_core::dashboard_state::LastWorkflow;
use loom_core::id::SequentialIdGen;
use loom_core::ids::OrchestrationId;
use loom_storage::SpawnIntent;
use tempfile::tempdir;

fn layout(dir: &std::path::Path) -> WorkflowsLayout {
    WorkflowsLayout::new(dir)
}

#[tokio::test]
async fn spawns_and_records_last_workflow() {
    let dir = tempdir().unwrap();
    let layout = layout(dir.path());
    let dashboard = DashboardStateStore::new(&layout);
    let agent = FakeAgentCli::new();
    let id_gen = SequentialIdGen::new("wf");
    let orchestration_id = OrchestrationId::new("orch-1");

    let snapshot = spawn_workflow(
        &agent,
        &id_gen,
        &layout,
        &dashboard,
        &orchestration_id,
        "flow.design",
        None,
        dir.path(),
        None,
        Utc::now(),
    )
    .await
    .unwrap()
    .expect("spawn should succeed");

    assert_eq!(snapshot.status, WorkflowStatus::Running);
    assert_eq!(agent.calls().len(), 1);
    assert_eq!(agent.calls()[0].skill, "flow.design");

    let state = dashboard.read().unwrap();
    let last = state.last_workflow.expect("last_workflow recorded");
    assert_eq!(last.id, snapshot.id);
    assert_eq!(last.skill, "flow.design");

    let pids = PidsStore::new(&layout, snapshot.id.as_str()).read().unwrap();
    assert!(pids.is_some());
}

#[tokio::test]
async fn links_workflow_into_batch_item() {
    let dir = tempdir().unwrap();
    let layout = layout(dir.path());
    let dashboard = DashboardStateStore::new(&layout);
    dashboard
        .update(|state| {
            state.batches.total = 1;
            state
                .batches
                .items
                .push(loom_core::batch::BatchItem::new(0, "Auth", vec!["T001".into()]));
        })
        .unwrap();

    let agent = FakeAgentCli::new();
    let id_gen = SequentialIdGen::new("wf");
    let orchestration_id = OrchestrationId::new("orch-1");

    let snapshot = spawn_workflow(
        &agent,
        &id_gen,
        &layout,
        &dashboard,
        &orchestration_id,
        "flow.implement",
        Some("context"),
        dir.path(),
        Some(0),
        Utc::now(),
    )
    .await
    .unwrap()
    .unwrap();

    let state = dashboard.read().unwrap();
    let item = &state.batches.items[0];
    assert_eq!(item.workflow_id.as_ref().unwrap(), &snapshot.id);
    assert_eq!(item.status, BatchStatus::Running);
}

#[tokio::test]
async fn returns_none_when_intent_is_fresh() {
    let dir = tempdir().unwrap();
    let layout = layout(dir.path());
    let dashboard = DashboardStateStore::new(&layout);
    let agent = FakeAgentCli::new();
    let id_gen = SequentialIdGen::new("wf");
    let orchestration_id = OrchestrationId::new("orch-1");
    let now = Utc::now();

    SpawnIntentStore::new(&layout, orchestration_id.as_str())
        .write(&SpawnIntent {
            skill: "flow.design".into(),
            orchestration_id: orchestration_id.as_str().to_string(),
            timestamp: now,
        })
        .unwrap();

    let result = spawn_workflow(
        &agent,
        &id_gen,
        &layout,
        &dashboard,
        &orchestration_id,
        "flow.design",
        None,
        dir.path(),
        None,
        now,
    )
    .await
    .unwrap();

    assert!(result.is_none());
    assert!(agent.calls().is_empty());
}

#[tokio::test]
async fn returns_none_when_a_workflow_is_already_active() {
    let dir = tempdir().unwrap();
    let layout = layout(dir.path());
    let dashboard = DashboardStateStore::new(&layout);
    dashboard
        .update(|state| {
            state.last_workflow = Some(LastWorkflow {
                id: loom_core::WorkflowId::new("wf-existing"),
                skill: "flow.design".into(),
                status: WorkflowStatus::Running,
            });
        })
        .unwrap();

    let agent = FakeAgentCli::new();
    let id_gen = SequentialIdGen::new("wf");
    let orchestration_id = OrchestrationId::new("orch-1");

    let result = spawn_workflow(
        &agent,
        &id_gen,
        &layout,
        &dashboard,
        &orchestration_id,
        "flow.design",
        None,
        dir.path(),
        None,
        Utc::now(),
    )
    .await
    .unwrap();

    assert!(result.is_none());
    assert!(agent.calls().is_empty());
}

#[tokio::test]
async fn intent_file_is_gone_after_spawn_returns() {
    let dir = tempdir().unwrap();
    let layout = layout(dir.path());
    let dashboard = DashboardStateStore::new(&layout);
    let agent = FakeAgentCli::new();
    let id_gen = SequentialIdGen::new("wf");
    let orchestration_id = OrchestrationId::new("orch-1");

    spawn_workflow(
        &agent,
        &id_gen,
        &layout,
        &dashboard,
        &orchestration_id,
        "flow.design",
        None,
        dir.path(),
        None,
        Utc::now(),
    )
    .await
    .unwrap();

    let intent = SpawnIntentStore::new(&layout, orchestration_id.as_str())
        .read()
        .unwrap();
    assert!(intent.is_none());
}

#[tokio::test]
async fn intent_file_is_gone_even_when_spawn_fails() {
    let dir = tempdir().unwrap();
    let layout = layout(dir.path());
    let dashboard = DashboardStateStore::new(&layout);
    let agent = FakeAgentCli::new();
    agent.set_spawn_error("boom");
    let id_gen = SequentialIdGen::new("wf");
    let orchestration_id = OrchestrationId::new("orch-1");

    let result = spawn_workflow(
        &agent,
        &id_gen,
        &layout,
        &dashboard,
        &orchestration_id,
        "flow.design",
        None,
        dir.path(),
        None,
        Utc::now(),
    )
    .await;

    assert!(result.is_err());
    let intent = SpawnIntentStore::new(&layout, orchestration_id.as_str())
        .read()
        .unwrap();
    assert!(intent.is_none());
}

#[tokio::test]
async fn cancel_terminates_and_clears_pids() {
    let dir = tempdir().unwrap();
    let layout = layout(dir.path());
    let workflow_id = loom_core::WorkflowId::new("wf-1");
    PidsStore::new(&layout, workflow_id.as_str())
        .write(loom_storage::PersistedPids {
            launcher_pid: 1,
            agent_pid: 2,
        })
        .unwrap();

    let agent = FakeAgentCli::new();
    terminate_workflow_with_grace(&agent, &layout, &workflow_id, 0)
        .await
        .unwrap();

    assert_eq!(agent.terminated(), vec![(1, 2)]);
    assert!(PidsStore::new(&layout, workflow_id.as_str()).read().unwrap().is_none());
}

#[tokio::test]
async fn cancel_is_a_noop_without_a_pid_record() {
    let dir = tempdir().unwrap();
    let layout = layout(dir.path());
    let workflow_id = loom_core::WorkflowId::new("wf-never-spawned");
    let agent = FakeAgentCli::new();

    terminate_workflow_with_grace(&agent, &layout, &workflow_id, 0)
        .await
        .unwrap();

    assert!(agent.terminated().is_empty());
}
