//! Subcommand implementations: `start`, `status`, `cancel`, `recover`
//! (§10.4, mapping onto the `start/status/cancel/handleRecovery` operations
//! named across §4-§7). Scaled down from the teacher's `commands/` directory
//! of per-entity files (job, worker, cron, pipeline, ...) to one file per
//! this workspace's single entity, the orchestration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, ValueEnum};
use serde::Serialize;

use loom_adapters::agent_cli::RealAgentCli;
use loom_adapters::step_setter::{RealStepSetter, StepSetter};
use loom_core::{ActiveOrchestration, IdGen, OrchestrationId, OrchestrationStatus, StepName, StepStatus, UuidIdGen};
use loom_daemon::lifecycle::{Config, ConfigOverrides, DaemonPaths};
use loom_engine::cancel_workflow;
use loom_storage::{DashboardStateStore, StepStateStore, WorkflowsLayout};

use crate::daemon_spawn;
use crate::output::OutputFormat;

const DAEMON_READY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Args, Debug, Default)]
pub struct StartArgs {
    #[arg(long)]
    pub auto_merge: bool,
    #[arg(long)]
    pub no_auto_heal: bool,
    #[arg(long)]
    pub max_heal_attempts: Option<u32>,
    #[arg(long)]
    pub pause_between_batches: bool,
    #[arg(long)]
    pub require_merge_gate: bool,
    #[arg(long)]
    pub skip_design: bool,
    #[arg(long)]
    pub skip_analyze: bool,
    #[arg(long)]
    pub skip_implement: bool,
    #[arg(long)]
    pub skip_verify: bool,
    #[arg(long)]
    pub additional_context: Option<String>,
    #[arg(long)]
    pub max_total_budget: Option<f64>,
}

impl StartArgs {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            auto_merge: self.auto_merge.then_some(true),
            auto_heal_enabled: self.no_auto_heal.then_some(false),
            max_heal_attempts: self.max_heal_attempts,
            pause_between_batches: self.pause_between_batches.then_some(true),
            batch_size_fallback: None,
            skip_design: self.skip_design.then_some(true),
            skip_analyze: self.skip_analyze.then_some(true),
            skip_implement: self.skip_implement.then_some(true),
            skip_verify: self.skip_verify.then_some(true),
            require_merge_gate: self.require_merge_gate.then_some(true),
            additional_context: self.additional_context,
            max_total_budget: self.max_total_budget,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RecoverAction {
    Retry,
    Skip,
    Abort,
}

pub async fn start(project_root: PathBuf, args: StartArgs, format: OutputFormat) -> Result<()> {
    let config = Config::load(&project_root, args.into_overrides())?;

    let layout = WorkflowsLayout::new(&project_root);
    let dashboard_store = DashboardStateStore::new(&layout);
    let step_store = StepStateStore::new(&layout);

    let existing = dashboard_store.read()?;
    if let Some(active) = &existing.active {
        if !active.status.is_terminal() {
            bail!("an orchestration is already active ({}, status {:?})", active.id, active.status);
        }
    }

    let id = OrchestrationId::new(UuidIdGen.next());
    let started_at = Utc::now();

    dashboard_store.update(|state| {
        state.active = Some(ActiveOrchestration {
            id: id.clone(),
            started_at,
            status: OrchestrationStatus::Running,
            config: config.clone(),
        });
        state.batches = Default::default();
        state.last_workflow = None;
        state.recovery_context = None;
        state.user_gate_confirmed = false;
    })?;

    // A prior orchestration that ran to completion left `step-state.json`
    // at `Complete`; a fresh run starts the pipeline over from `design`.
    // A step left mid-pipeline (the common case after `cancel`/`abort`)
    // is resumed in place rather than reset.
    let step = step_store.read()?;
    if step.current == StepName::Complete {
        RealStepSetter::new()
            .set_step(&project_root, StepName::Design, StepStatus::NotStarted, StepName::Design.index())
            .await
            .context("failed to reset step state for the new orchestration")?;
    }

    daemon_spawn::spawn_background(&project_root, id.as_str()).context("failed to spawn loomd")?;
    let paths = DaemonPaths::for_project(&project_root);
    daemon_spawn::wait_until_ready(&paths.lock_path, DAEMON_READY_TIMEOUT).context("loomd failed to start")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "orchestrationId": id.as_str(), "status": "running" })),
        OutputFormat::Text => println!("started orchestration {id}"),
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusView {
    active: Option<loom_core::ActiveOrchestration>,
    step: loom_core::Step,
    batches: loom_core::BatchTracking,
    last_workflow: Option<loom_core::LastWorkflow>,
    cost: loom_core::Cost,
    recovery_context: Option<loom_core::RecoveryContext>,
}

pub async fn status(project_root: PathBuf, format: OutputFormat) -> Result<()> {
    let layout = WorkflowsLayout::new(&project_root);
    let state = DashboardStateStore::new(&layout).read()?;
    let step = StepStateStore::new(&layout).read()?;

    let view = StatusView {
        active: state.active,
        step,
        batches: state.batches,
        last_workflow: state.last_workflow,
        cost: state.cost,
        recovery_context: state.recovery_context,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Text => print_status_text(&view),
    }
    Ok(())
}

fn print_status_text(view: &StatusView) {
    match &view.active {
        None => println!("no active orchestration"),
        Some(active) => {
            println!("orchestration {} — {:?}", active.id, active.status);
            println!("step: {:?} ({:?})", view.step.current, view.step.status);
            if view.batches.total > 0 {
                println!("batches: {}/{} (current {})", view.batches.current + 1, view.batches.total, view.batches.current);
            }
            if let Some(last) = &view.last_workflow {
                println!("last workflow: {} [{}] — {:?}", last.id, last.skill, last.status);
            }
            println!("cost: ${:.2}", view.cost.total);
            if let Some(recovery) = &view.recovery_context {
                println!("needs attention: {} (options: {:?})", recovery.issue, recovery.options);
            }
        }
    }
}

pub async fn cancel(project_root: PathBuf) -> Result<()> {
    let layout = WorkflowsLayout::new(&project_root);
    let dashboard_store = DashboardStateStore::new(&layout);
    let state = dashboard_store.read()?;

    let Some(active) = state.active.clone() else {
        println!("no active orchestration");
        return Ok(());
    };
    if active.status.is_terminal() {
        println!("orchestration {} is already {:?}", active.id, active.status);
        return Ok(());
    }

    if let Some(last) = &state.last_workflow {
        cancel_workflow(&RealAgentCli::new(), &layout, &last.id).await?;
    }

    dashboard_store.update(|state| {
        if let Some(active) = state.active.as_mut() {
            active.status = OrchestrationStatus::Cancelled;
        }
    })?;

    println!("cancelled orchestration {}", active.id);
    Ok(())
}

pub async fn recover(project_root: PathBuf, action: RecoverAction) -> Result<()> {
    let layout = WorkflowsLayout::new(&project_root);
    let dashboard_store = DashboardStateStore::new(&layout);
    let step_store = StepStateStore::new(&layout);
    let state = dashboard_store.read()?;

    let Some(active) = state.active.clone() else {
        bail!("no active orchestration");
    };
    if active.status != OrchestrationStatus::NeedsAttention {
        bail!("orchestration {} is not awaiting recovery (status: {:?})", active.id, active.status);
    }

    match action {
        RecoverAction::Retry => {
            dashboard_store.update(|state| {
                if let Some(active) = state.active.as_mut() {
                    active.status = OrchestrationStatus::Running;
                }
                state.recovery_context = None;
            })?;
        }
        RecoverAction::Skip => {
            let step = step_store.read()?;
            let next = step.current.next().unwrap_or(StepName::Complete);
            RealStepSetter::new()
                .set_step(&project_root, next, StepStatus::NotStarted, next.index())
                .await
                .context("failed to advance step state")?;
            dashboard_store.update(|state| {
                if let Some(active) = state.active.as_mut() {
                    active.status = OrchestrationStatus::Running;
                }
                state.recovery_context = None;
            })?;
        }
        RecoverAction::Abort => {
            if let Some(last) = &state.last_workflow {
                cancel_workflow(&RealAgentCli::new(), &layout, &last.id).await?;
            }
            dashboard_store.update(|state| {
                if let Some(active) = state.active.as_mut() {
                    active.status = OrchestrationStatus::Cancelled;
                }
                state.recovery_context = None;
            })?;
        }
    }

    println!("applied recovery action {action:?} to orchestration {}", active.id);
    Ok(())
}

/// Resolve the project root a command should operate on: the `--project`
/// flag if given, else the current working directory.
pub fn resolve_project_root(project: Option<PathBuf>) -> Result<PathBuf> {
    let root = match project {
        Some(path) => path,
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    Ok(root)
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
