//! The closed action vocabulary `decide()` returns (§4.4). A `Decision` is
//! a tagged union carried as one struct with optional fields, matching the
//! teacher's preference for data-carrying enums expressed as a flat struct
//! plus an `Action` tag rather than per-variant payloads (see
//! `loom_core::effect::Effect` for the same shape applied to side effects).

use crate::dashboard_state::RecoveryOption;
use crate::step::StepName;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Idle,
    Wait,
    WaitWithBackoff,
    WaitUserGate,
    WaitMerge,
    Spawn,
    Transition,
    AdvanceBatch,
    InitializeBatches,
    HealBatch,
    Pause,
    ForceStepComplete,
    RecoverStale,
    RecoverFailed,
    NeedsAttention,
    Fail,
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<StepName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_after_advance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_options: Option<Vec<RecoveryOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
}

impl Decision {
    pub fn new(action: Action, reason: impl Into<String>) -> Self {
        Self {
            action,
            reason: reason.into(),
            skill: None,
            next_step: None,
            next_index: None,
            context: None,
            batch_index: None,
            pause_after_advance: None,
            error_message: None,
            recovery_options: None,
            backoff_ms: None,
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_next_step(mut self, step: StepName) -> Self {
        self.next_index = Some(step.index());
        self.next_step = Some(step);
        self
    }

    pub fn with_batch_index(mut self, index: usize) -> Self {
        self.batch_index = Some(index);
        self
    }

    pub fn with_pause_after_advance(mut self, pause: bool) -> Self {
        self.pause_after_advance = Some(pause);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_recovery_options(mut self, options: Vec<RecoveryOption>) -> Self {
        self.recovery_options = Some(options);
        self
    }

    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = Some(backoff_ms);
        self
    }

    /// Whether the runner loop should append this decision to the decision
    /// log (§4.6: "if the decision is not wait/idle, append it").
    pub fn is_loggable(&self) -> bool {
        !matches!(self.action, Action::Wait | Action::Idle)
    }
}

#[cfg(test)]
#[path = "decision_core_tests.rs"]
mod tests;
