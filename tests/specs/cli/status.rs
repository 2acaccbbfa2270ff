use crate::prelude::*;

#[test]
fn status_on_a_fresh_project_reports_no_active_orchestration() {
    let project = Project::empty();
    project.loom().args(&["status"]).passes().stdout_has("no active orchestration");
}

#[test]
fn status_json_on_a_fresh_project_is_well_formed() {
    let project = Project::empty();
    let run = project.loom().args(&["--format", "json", "status"]).passes();
    let value: serde_json::Value = serde_json::from_str(&run.stdout()).expect("status --format json should emit JSON");
    assert!(value.get("active").map(|v| v.is_null()).unwrap_or(false));
}
