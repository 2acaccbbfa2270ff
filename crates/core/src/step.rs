//! The current pipeline phase and its status, as maintained jointly by
//! external sub-commands and the core (see `set_step` in `loom-storage`).

use serde::{Deserialize, Serialize};

/// One of the five phases, plus the terminal `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Design,
    Analyze,
    Implement,
    Verify,
    Merge,
    Complete,
}

impl StepName {
    /// `0..4` for the five driven phases; `Complete` has no meaningful index
    /// slot of its own and reuses `Merge`'s, since `index` only exists to
    /// mirror the position external sub-commands already write.
    pub fn index(self) -> u32 {
        match self {
            StepName::Design => 0,
            StepName::Analyze => 1,
            StepName::Implement => 2,
            StepName::Verify => 3,
            StepName::Merge | StepName::Complete => 4,
        }
    }

    /// The phase after this one, or `None` once `Complete` is reached.
    pub fn next(self) -> Option<StepName> {
        match self {
            StepName::Design => Some(StepName::Analyze),
            StepName::Analyze => Some(StepName::Implement),
            StepName::Implement => Some(StepName::Verify),
            StepName::Verify => Some(StepName::Merge),
            StepName::Merge => Some(StepName::Complete),
            StepName::Complete => None,
        }
    }

    /// The agent-CLI skill name spawned for this phase. `Complete` spawns
    /// nothing.
    pub fn skill(self) -> Option<&'static str> {
        match self {
            StepName::Design => Some("flow.design"),
            StepName::Analyze => Some("flow.analyze"),
            StepName::Implement => Some("flow.implement"),
            StepName::Verify => Some("flow.verify"),
            StepName::Merge => Some("flow.merge"),
            StepName::Complete => None,
        }
    }
}

/// Status of the current step, written by the step-state setter utility
/// and read by the runner loop on every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    NotStarted,
    Pending,
    InProgress,
    Complete,
    Failed,
    Blocked,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub current: StepName,
    pub index: u32,
    pub status: StepStatus,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            current: StepName::Design,
            index: 0,
            status: StepStatus::NotStarted,
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
