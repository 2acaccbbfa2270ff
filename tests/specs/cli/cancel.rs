use crate::prelude::*;

#[test]
fn cancel_on_a_fresh_project_is_idempotent() {
    let project = Project::empty();
    project.loom().args(&["cancel"]).passes().stdout_has("no active orchestration");
    // (R3) calling cancel twice is equivalent to calling it once.
    project.loom().args(&["cancel"]).passes().stdout_has("no active orchestration");
}
