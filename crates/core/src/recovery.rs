//! The per-cause recovery-options table (§4.4a), resolving the spec's first
//! Open Question: the source is inconsistent between `{retry, abort}` and
//! `{retry, skip, abort}` across call sites, so this is a documented table
//! keyed by cause rather than inlined per call site.

use crate::dashboard_state::RecoveryOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCause {
    /// Gate 3: orchestration wall clock exceeded. No single step or batch
    /// to "skip" forward from, so only two options make sense.
    DurationExceeded,
    WorkflowFailed,
    WorkflowCancelled,
    UnknownStatus,
    StaleWorkflow,
    StepFailedOrBlocked,
    HealExhausted,
}

pub fn recovery_options_for(cause: RecoveryCause) -> Vec<RecoveryOption> {
    use RecoveryOption::*;
    match cause {
        RecoveryCause::DurationExceeded => vec![Retry, Abort],
        RecoveryCause::WorkflowFailed
        | RecoveryCause::WorkflowCancelled
        | RecoveryCause::UnknownStatus
        | RecoveryCause::StaleWorkflow
        | RecoveryCause::StepFailedOrBlocked
        | RecoveryCause::HealExhausted => vec![Retry, Skip, Abort],
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
