use crate::prelude::*;

#[test]
fn recover_on_a_fresh_project_fails_with_no_active_orchestration() {
    let project = Project::empty();
    project
        .loom()
        .args(&["recover", "retry"])
        .fails()
        .stderr_has("no active orchestration");
}

#[test]
fn recover_rejects_an_unknown_action() {
    let project = Project::empty();
    project.loom().args(&["recover", "rewind"]).fails();
}
