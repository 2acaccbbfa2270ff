//! Batch tracking: the implement phase's decomposition into sequential
//! groups of tasks, each driven by one `flow.implement` workflow.

use crate::ids::WorkflowId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Running,
    Completed,
    Healed,
    Failed,
}

impl BatchStatus {
    pub fn is_done(self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Healed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub section: String,
    pub task_ids: Vec<String>,
    pub status: BatchStatus,
    #[serde(default)]
    pub heal_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healer_execution_id: Option<String>,
}

impl BatchItem {
    pub fn new(index: usize, section: impl Into<String>, task_ids: Vec<String>) -> Self {
        Self {
            index,
            section: section.into(),
            task_ids,
            status: BatchStatus::Pending,
            heal_attempts: 0,
            workflow_id: None,
            healer_execution_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchTracking {
    pub total: usize,
    pub current: usize,
    pub items: Vec<BatchItem>,
}

impl BatchTracking {
    pub fn current_item(&self) -> Option<&BatchItem> {
        self.items.get(self.current)
    }

    pub fn current_item_mut(&mut self) -> Option<&mut BatchItem> {
        self.items.get_mut(self.current)
    }

    pub fn is_last(&self) -> bool {
        self.total > 0 && self.current + 1 == self.total
    }

    /// True once every batch item has settled into `completed` or `healed`.
    pub fn all_done(&self) -> bool {
        self.total > 0 && self.items.iter().all(|item| item.status.is_done())
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
