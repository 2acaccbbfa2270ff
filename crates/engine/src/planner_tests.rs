use super::*;

#[test]
fn empty_document_yields_empty_plan() {
    let plan = plan_batches("", 5);
    assert!(plan.batches.is_empty());
    assert_eq!(plan.total_incomplete, 0);
    assert!(!plan.used_fallback);
}

#[test]
fn only_completed_tasks_yields_empty_plan() {
    let doc = "## Core\n- [x] T001\n- [X] T002\n";
    let plan = plan_batches(doc, 5);
    assert!(plan.batches.is_empty());
    assert_eq!(plan.total_incomplete, 0);
}

#[test]
fn sections_with_incomplete_tasks_become_batches() {
    let doc = "## Core\n- [ ] T001\n- [ ] T002\n## Misc\n- [ ] T003\n";
    let plan = plan_batches(doc, 5);
    assert!(!plan.used_fallback);
    assert_eq!(plan.total_incomplete, 3);
    assert_eq!(plan.batches.len(), 2);
    assert_eq!(plan.batches[0].name, "Core");
    assert_eq!(plan.batches[0].task_ids, vec!["T001", "T002"]);
    assert_eq!(plan.batches[1].name, "Misc");
    assert_eq!(plan.batches[1].task_ids, vec!["T003"]);
}

#[test]
fn sections_with_no_incomplete_tasks_are_omitted() {
    let doc = "## Done\n- [x] T001\n## Core\n- [ ] T002\n";
    let plan = plan_batches(doc, 5);
    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.batches[0].name, "Core");
}

#[test]
fn falls_back_to_fixed_chunks_without_any_incomplete_section() {
    let doc = "- [ ] T001\n- [ ] T002\n- [ ] T003\n- [ ] T004\n- [ ] T005\n";
    let plan = plan_batches(doc, 2);
    assert!(plan.used_fallback);
    assert_eq!(plan.fallback_size, Some(2));
    assert_eq!(plan.batches.len(), 3);
    assert_eq!(plan.batches[0].name, "Batch 1");
    assert_eq!(plan.batches[0].task_ids, vec!["T001", "T002"]);
    assert_eq!(plan.batches[1].task_ids, vec!["T003", "T004"]);
    assert_eq!(plan.batches[2].task_ids, vec!["T005"]);
}

#[test]
fn intra_batch_dependencies_are_topologically_sorted() {
    let doc = "## Core\n- [ ] T002 [depends: T001]\n- [ ] T001\n";
    let plan = plan_batches(doc, 5);
    assert_eq!(plan.batches[0].task_ids, vec!["T001", "T002"]);
}

#[test]
fn dependency_outside_batch_is_ignored_for_ordering_but_warns_if_missing() {
    let doc = "## Core\n- [ ] T001 [dep: T999]\n";
    let plan = plan_batches(doc, 5);
    assert_eq!(plan.batches[0].task_ids, vec!["T001"]);
    assert_eq!(
        plan.dependency_warnings,
        vec!["Task T001 depends on T999, which doesn't exist".to_string()]
    );
}

#[test]
fn cycle_falls_back_to_document_order_with_warning() {
    let doc = "## Core\n- [ ] T001 [depends: T002]\n- [ ] T002 [depends: T001]\n";
    let plan = plan_batches(doc, 5);
    assert_eq!(plan.batches[0].task_ids, vec!["T001", "T002"]);
    assert_eq!(plan.dependency_warnings.len(), 1);
    assert!(plan.dependency_warnings[0].contains("cycle"));
}

#[test]
fn after_and_dep_aliases_are_recognized_case_insensitively() {
    let doc = "## Core\n- [ ] T002 [AFTER: T001]\n- [ ] T001\n";
    let plan = plan_batches(doc, 5);
    assert_eq!(plan.batches[0].task_ids, vec!["T001", "T002"]);
}

#[test]
fn task_line_without_id_is_silently_skipped() {
    let doc = "## Core\n- [ ] not a task\n- [ ] T001\n";
    let plan = plan_batches(doc, 5);
    assert_eq!(plan.batches[0].task_ids, vec!["T001"]);
    assert_eq!(plan.total_incomplete, 1);
}

#[test]
fn duplicate_task_ids_preserved_in_order() {
    let doc = "## Core\n- [ ] T001\n- [ ] T001\n";
    let plan = plan_batches(doc, 5);
    assert_eq!(plan.batches[0].task_ids, vec!["T001", "T001"]);
}

#[test]
fn implicit_leading_tasks_trigger_fallback_when_no_header_present() {
    let doc = "- [ ] T001\n- [ ] T002\n";
    let plan = plan_batches(doc, 10);
    assert!(plan.used_fallback);
    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.batches[0].task_ids, vec!["T001", "T002"]);
}
