//! Wires the `Real*` adapters into a [`RunnerHandles`] and drives one
//! orchestration's runner loop (C6) from process start to exit, running
//! the startup reconciler (C8) first. This is the whole of what `loomd`
//! does once it holds the project lock.

use std::path::PathBuf;
use std::sync::Arc;

use loom_adapters::agent_cli::RealAgentCli;
use loom_adapters::heal::RealHealRoutine;
use loom_adapters::notify_watch::{FileEventSubscriber, RealFileEventSubscriber};
use loom_adapters::step_setter::RealStepSetter;
use loom_core::{IdGen, OrchestrationId, UuidIdGen};
use loom_engine::registry::RunnerRegistry;
use loom_engine::runner::RunnerHandles;
use loom_storage::{DashboardStateStore, RunnerMarkerStore, StepStateStore, WorkflowsLayout};

/// Concrete adapter instantiation `loomd` runs in production; tests drive
/// `loom_engine::runner::run_once` directly against `Fake*` adapters
/// instead of going through this function.
pub async fn run_supervisor(project_root: PathBuf, orchestration_id: OrchestrationId) {
    let layout = WorkflowsLayout::new(&project_root);

    let marker_store = RunnerMarkerStore::new(layout.clone());
    match loom_engine::reconcile_runner_markers(&marker_store, std::process::id()) {
        Ok(report) => {
            for id in report.orphaned_orchestration_ids() {
                tracing::warn!(orchestration_id = id, "reclaimed orphaned runner marker at startup");
            }
        }
        Err(err) => tracing::warn!(%err, "startup reconciliation failed"),
    }

    let handles = RunnerHandles {
        agent_cli: Arc::new(RealAgentCli::new()),
        step_setter: Arc::new(RealStepSetter::new()),
        heal_routine: Arc::new(RealHealRoutine::new(RealAgentCli::new())),
        id_gen: Arc::new(UuidIdGen) as Arc<dyn IdGen>,
        layout: layout.clone(),
        dashboard_store: DashboardStateStore::new(&layout),
        step_store: StepStateStore::new(&layout),
        registry: RunnerRegistry::new(),
        project_root: project_root.clone(),
    };

    let subscriber: Arc<dyn FileEventSubscriber> = Arc::new(RealFileEventSubscriber::new());
    let project_id = project_root.display().to_string();

    loom_engine::runner::run(handles, orchestration_id, subscriber, project_id).await;
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
