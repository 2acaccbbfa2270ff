//! The per-project supervisor process: acquires an exclusive lock over a
//! project's `.state/` directory, wires the `Real*` adapters into a
//! [`loom_engine::runner::RunnerHandles`], and drives one orchestration's
//! runner loop (C6) to completion. One process per dashboard instance
//! (§5), spawned and tracked by `loom-cli` the way the teacher's `oj`
//! spawns and tracks `ojd`.

pub mod lifecycle;
pub mod logging;
pub mod supervisor;

pub use lifecycle::{Config, ConfigOverrides, DaemonPaths, LifecycleError, LockGuard};
pub use supervisor::run_supervisor;
