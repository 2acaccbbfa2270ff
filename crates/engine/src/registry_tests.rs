use super::*;
use loom_core::test_support::orchestration_id;

#[test]
fn start_assigns_increasing_generations() {
    let registry = RunnerRegistry::new();
    let id = orchestration_id(1);
    assert_eq!(registry.start(id.clone()), 1);
    assert_eq!(registry.start(id), 2);
}

#[test]
fn older_generation_is_no_longer_current_after_supersession() {
    let registry = RunnerRegistry::new();
    let id = orchestration_id(1);
    let first = registry.start(id.clone());
    let second = registry.start(id.clone());
    assert!(!registry.is_current(&id, first));
    assert!(registry.is_current(&id, second));
}

#[test]
fn stop_removes_the_entry() {
    let registry = RunnerRegistry::new();
    let id = orchestration_id(1);
    let gen = registry.start(id.clone());
    registry.stop(&id);
    assert!(!registry.is_current(&id, gen));
}
