//! Per-orchestration configuration, loaded by `loom-daemon` from
//! `.oj/orchestrate.toml` with CLI flags taking final precedence (see
//! `loom_daemon::lifecycle::Config`).

use serde::{Deserialize, Serialize};

fn default_stale_threshold_secs() -> u64 {
    300
}

fn default_wall_clock_cap_secs() -> u64 {
    14_400
}

fn default_batch_size_fallback() -> usize {
    5
}

/// Spending caps, in USD. A `max_total` this large is effectively
/// "unlimited" while still being a finite, JSON-representable default.
fn default_unlimited_budget() -> f64 {
    1_000_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    pub max_per_batch: f64,
    pub max_total: f64,
    pub healing_budget: f64,
    pub decision_budget: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_per_batch: default_unlimited_budget(),
            max_total: default_unlimited_budget(),
            healing_budget: default_unlimited_budget(),
            decision_budget: default_unlimited_budget(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    pub auto_merge: bool,
    pub auto_heal_enabled: bool,
    pub max_heal_attempts: u32,
    pub pause_between_batches: bool,
    #[serde(default = "default_batch_size_fallback")]
    pub batch_size_fallback: usize,
    pub skip_design: bool,
    pub skip_analyze: bool,
    pub skip_implement: bool,
    pub skip_verify: bool,
    /// Whether the `verify` → `merge` transition waits on an explicit
    /// human confirmation (`dashboard_state.user_gate_confirmed`) before
    /// proceeding to the auto-merge check.
    pub require_merge_gate: bool,
    pub additional_context: String,
    pub budget: Budget,
    #[serde(default = "default_stale_threshold_secs")]
    pub stale_threshold_secs: u64,
    #[serde(default = "default_wall_clock_cap_secs")]
    pub wall_clock_cap_secs: u64,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            auto_merge: false,
            auto_heal_enabled: true,
            max_heal_attempts: 2,
            pause_between_batches: false,
            batch_size_fallback: default_batch_size_fallback(),
            skip_design: false,
            skip_analyze: false,
            skip_implement: false,
            skip_verify: false,
            require_merge_gate: false,
            additional_context: String::new(),
            budget: Budget::default(),
            stale_threshold_secs: default_stale_threshold_secs(),
            wall_clock_cap_secs: default_wall_clock_cap_secs(),
        }
    }
}

impl OrchestrationConfig {
    /// Whether `step` is configured to be skipped entirely (`merge` and
    /// `complete` are never skippable).
    pub fn skips(&self, step: crate::step::StepName) -> bool {
        use crate::step::StepName::*;
        match step {
            Design => self.skip_design,
            Analyze => self.skip_analyze,
            Implement => self.skip_implement,
            Verify => self.skip_verify,
            Merge | Complete => false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
