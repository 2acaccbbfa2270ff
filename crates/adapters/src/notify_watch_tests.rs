use super::*;

#[tokio::test]
async fn fake_subscriber_wakes_on_matching_category() {
    let subscriber = FakeFileEventSubscriber::new();
    let mut rx = subscriber.subscribe("proj-1");

    subscriber.fire("proj-1", FileEventCategory::Workflow);

    let event = rx.recv().await.expect("event delivered");
    assert_eq!(event.project_id, "proj-1");
    assert_eq!(event.category, FileEventCategory::Workflow);
}

#[tokio::test]
async fn fake_subscriber_ignores_non_waking_categories() {
    let subscriber = FakeFileEventSubscriber::new();
    let mut rx = subscriber.subscribe("proj-1");

    subscriber.fire("proj-1", FileEventCategory::Heartbeat);

    let result = tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
    assert!(result.is_err(), "heartbeat events must not wake the runner");
}

#[tokio::test]
async fn fake_subscriber_does_not_cross_wires_between_projects() {
    let subscriber = FakeFileEventSubscriber::new();
    let mut rx_a = subscriber.subscribe("proj-a");
    let mut rx_b = subscriber.subscribe("proj-b");

    subscriber.fire("proj-a", FileEventCategory::Tasks);

    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn only_tasks_workflow_state_wake_runner() {
    assert!(FileEventCategory::Tasks.wakes_runner());
    assert!(FileEventCategory::Workflow.wakes_runner());
    assert!(FileEventCategory::State.wakes_runner());
    assert!(!FileEventCategory::Registry.wakes_runner());
    assert!(!FileEventCategory::Phases.wakes_runner());
    assert!(!FileEventCategory::Heartbeat.wakes_runner());
    assert!(!FileEventCategory::Session.wakes_runner());
}
