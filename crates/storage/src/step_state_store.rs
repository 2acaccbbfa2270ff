//! Owns `step-state.json` for one project. The core only ever *reads* this
//! document directly — writes go through the external step-state setter
//! utility (§4.2, §9 Open Question resolution), which is why this store
//! exposes `write` at all only for that setter's adapters to call, never
//! for the engine to call directly.

use crate::atomic::{read_json_safe, write_json_atomic, AtomicIoError};
use crate::paths::WorkflowsLayout;
use loom_core::Step;
use std::path::PathBuf;

#[derive(Clone)]
pub struct StepStateStore {
    path: PathBuf,
}

impl StepStateStore {
    pub fn new(layout: &WorkflowsLayout) -> Self {
        Self {
            path: layout.step_state(),
        }
    }

    pub fn read(&self) -> Result<Step, AtomicIoError> {
        Ok(read_json_safe(&self.path)?.unwrap_or_default())
    }

    /// Write the step triple atomically. Reserved for the step-state
    /// setter utility's implementations (`loom_adapters::step_setter`); the
    /// engine always goes through that trait, never this method, so the
    /// "single write operation" invariant in §4.2 holds at the type level.
    pub fn write(&self, step: &Step) -> Result<(), AtomicIoError> {
        write_json_atomic(&self.path, step)
    }
}

#[cfg(test)]
#[path = "step_state_store_tests.rs"]
mod tests;
