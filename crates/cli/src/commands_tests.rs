use super::*;

use loom_core::OrchestrationConfig;
use loom_storage::WorkflowsLayout;

fn seed_active(dir: &std::path::Path, status: OrchestrationStatus) {
    let layout = WorkflowsLayout::new(dir);
    let store = DashboardStateStore::new(&layout);
    store
        .update(|state| {
            state.active = Some(ActiveOrchestration {
                id: OrchestrationId::new("orch-1"),
                started_at: Utc::now(),
                status,
                config: OrchestrationConfig::default(),
            });
        })
        .unwrap();
}

#[tokio::test]
async fn cancel_without_an_active_orchestration_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    cancel(dir.path().to_path_buf()).await.unwrap();

    let layout = WorkflowsLayout::new(dir.path());
    let state = DashboardStateStore::new(&layout).read().unwrap();
    assert!(state.active.is_none());
}

#[tokio::test]
async fn cancel_on_an_already_terminal_orchestration_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    seed_active(dir.path(), OrchestrationStatus::Cancelled);

    cancel(dir.path().to_path_buf()).await.unwrap();

    let layout = WorkflowsLayout::new(dir.path());
    let state = DashboardStateStore::new(&layout).read().unwrap();
    assert_eq!(state.active.unwrap().status, OrchestrationStatus::Cancelled);
}

#[tokio::test]
async fn cancel_marks_a_running_orchestration_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    seed_active(dir.path(), OrchestrationStatus::Running);

    cancel(dir.path().to_path_buf()).await.unwrap();

    let layout = WorkflowsLayout::new(dir.path());
    let state = DashboardStateStore::new(&layout).read().unwrap();
    assert_eq!(state.active.unwrap().status, OrchestrationStatus::Cancelled);
}

#[tokio::test]
async fn recover_without_needs_attention_status_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    seed_active(dir.path(), OrchestrationStatus::Running);

    let result = recover(dir.path().to_path_buf(), RecoverAction::Retry).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn recover_retry_resumes_running_and_clears_recovery_context() {
    let dir = tempfile::tempdir().unwrap();
    seed_active(dir.path(), OrchestrationStatus::NeedsAttention);
    let layout = WorkflowsLayout::new(dir.path());
    let dashboard_store = DashboardStateStore::new(&layout);
    dashboard_store
        .update(|state| {
            state.recovery_context = Some(loom_core::RecoveryContext {
                issue: "heal budget exhausted".to_string(),
                options: vec![loom_core::RecoveryOption::Retry],
                failed_workflow_id: None,
            });
        })
        .unwrap();

    recover(dir.path().to_path_buf(), RecoverAction::Retry).await.unwrap();

    let state = dashboard_store.read().unwrap();
    assert_eq!(state.active.unwrap().status, OrchestrationStatus::Running);
    assert!(state.recovery_context.is_none());
}

#[tokio::test]
async fn recover_abort_cancels_and_clears_recovery_context() {
    let dir = tempfile::tempdir().unwrap();
    seed_active(dir.path(), OrchestrationStatus::NeedsAttention);

    recover(dir.path().to_path_buf(), RecoverAction::Abort).await.unwrap();

    let layout = WorkflowsLayout::new(dir.path());
    let state = DashboardStateStore::new(&layout).read().unwrap();
    assert_eq!(state.active.unwrap().status, OrchestrationStatus::Cancelled);
    assert!(state.recovery_context.is_none());
}

#[test]
fn resolve_project_root_honors_the_explicit_flag() {
    let explicit = PathBuf::from("/tmp/somewhere");
    let resolved = resolve_project_root(Some(explicit.clone())).unwrap();
    assert_eq!(resolved, explicit);
}

#[test]
fn resolve_project_root_falls_back_to_the_current_directory() {
    let resolved = resolve_project_root(None).unwrap();
    assert_eq!(resolved, std::env::current_dir().unwrap());
}
