use super::*;

#[test]
fn layout_nests_everything_under_dot_state_workflows() {
    let layout = WorkflowsLayout::new("/tmp/project");
    assert_eq!(
        layout.dashboard_state(),
        PathBuf::from("/tmp/project/.state/workflows/dashboard-state.json")
    );
    assert_eq!(
        layout.runner_marker("orch-1"),
        PathBuf::from("/tmp/project/.state/workflows/runner-orch-1.json")
    );
    assert_eq!(
        layout.workflow_pids("wf-1"),
        PathBuf::from("/tmp/project/.state/workflows/wf-1/pids")
    );
}
