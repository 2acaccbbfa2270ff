//! The orchestration engine: the pure decision function (C4, §4.4), the
//! Markdown batch planner (C1, §4.1), and the stateful components built on
//! top of both — workflow spawning (C5), heal coordination (C7), startup
//! reconciliation (C8), and the runner loop that ties them together (C6).
//!
//! `loom-core` owns the data shapes; this crate owns the logic that reads
//! and produces them plus the I/O needed to act on a [`decision::Decision`].

pub mod decision;
pub mod heal;
pub mod planner;
pub mod reconcile;
pub mod registry;
pub mod runner;
pub mod spawner;

pub use decision::{decide, DecideInput};
pub use heal::{apply_post_workflow_reconciliation, run_batch_heal, HealDispatchOutcome};
pub use planner::{plan_batches, BatchPlan, PlannedBatch};
pub use reconcile::{reconcile_runner_markers, ReconcileReport, ReconciledMarker};
pub use registry::RunnerRegistry;
pub use runner::{run_once, RunnerHandles};
pub use spawner::{cancel_workflow, pause_workflow, spawn_workflow, SpawnGuardError};
