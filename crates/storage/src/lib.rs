//! The state store (C2): atomic read/write of dashboard state and step
//! state, the append-only decision log, and the file-backed mutex/liveness
//! documents (`SpawnIntent`, `RunnerMarker`) the rest of the workspace
//! coordinates through.
//!
//! Every document here lives under a project's `.state/workflows/`
//! directory (§6) and is JSON, written via write-to-temp-then-rename so a
//! crash mid-write never leaves a reader observing a truncated file.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod atomic;
pub mod dashboard_state_store;
pub mod paths;
pub mod pids_store;
pub mod runner_marker;
pub mod spawn_intent;
pub mod step_state_store;

pub use atomic::{read_json_safe, write_json_atomic};
pub use dashboard_state_store::DashboardStateStore;
pub use paths::WorkflowsLayout;
pub use pids_store::{PersistedPids, PidsStore};
pub use runner_marker::{RunnerMarker, RunnerMarkerStore};
pub use spawn_intent::{SpawnIntent, SpawnIntentStore, SPAWN_INTENT_TTL_SECS};
pub use step_state_store::StepStateStore;
