//! The per-orchestration dashboard state document (`loom-storage` owns its
//! persistence; the core only owns the shape).

use crate::batch::BatchTracking;
use crate::config::OrchestrationConfig;
use crate::ids::{OrchestrationId, WorkflowId};
use crate::workflow::WorkflowStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStatus {
    Running,
    Paused,
    WaitingMerge,
    NeedsAttention,
    Completed,
    Failed,
    Cancelled,
}

impl OrchestrationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrchestrationStatus::Completed
                | OrchestrationStatus::Failed
                | OrchestrationStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveOrchestration {
    pub id: OrchestrationId,
    pub started_at: DateTime<Utc>,
    pub status: OrchestrationStatus,
    pub config: OrchestrationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cost {
    pub total: f64,
    pub per_batch: Vec<f64>,
}

impl Cost {
    /// Cost only ever grows (property P5): never subtract here.
    pub fn add(&mut self, amount: f64) {
        self.total += amount;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastWorkflow {
    pub id: WorkflowId,
    pub skill: String,
    pub status: WorkflowStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOption {
    Retry,
    Skip,
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryContext {
    pub issue: String,
    pub options: Vec<RecoveryOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_workflow_id: Option<WorkflowId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardState {
    pub active: Option<ActiveOrchestration>,
    pub batches: BatchTracking,
    pub cost: Cost,
    pub last_workflow: Option<LastWorkflow>,
    pub decision_log: Vec<DecisionLogEntry>,
    pub recovery_context: Option<RecoveryContext>,
    /// Set by the `recover` CLI surface when a human confirms the merge
    /// gate (see `OrchestrationConfig::require_merge_gate`). Reset to
    /// `false` whenever a fresh orchestration starts.
    pub user_gate_confirmed: bool,
}

impl DashboardState {
    pub fn append_decision(&mut self, timestamp: DateTime<Utc>, action: String, reason: String) {
        self.decision_log.push(DecisionLogEntry {
            timestamp,
            action,
            reason,
        });
    }
}

#[cfg(test)]
#[path = "dashboard_state_tests.rs"]
mod tests;
