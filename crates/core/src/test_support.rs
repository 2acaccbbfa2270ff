//! Builders shared by downstream crates' tests, gated behind the
//! `test-support` feature (mirrors `loom-core`'s own `test_support` module in
//! the teacher, which exists for the same reason: every other crate's test
//! suite needs small, consistent scenario fixtures).

use crate::batch::{BatchItem, BatchStatus, BatchTracking};
use crate::config::OrchestrationConfig;
use crate::dashboard_state::{ActiveOrchestration, DashboardState, OrchestrationStatus};
use crate::ids::OrchestrationId;
use crate::step::{Step, StepName, StepStatus};
use chrono::{DateTime, Utc};

pub fn orchestration_id(n: u32) -> OrchestrationId {
    OrchestrationId::new(format!("orch-{n}"))
}

pub fn active_orchestration(
    id: OrchestrationId,
    status: OrchestrationStatus,
    config: OrchestrationConfig,
    started_at: DateTime<Utc>,
) -> ActiveOrchestration {
    ActiveOrchestration {
        id,
        started_at,
        status,
        config,
    }
}

pub fn step(current: StepName, status: StepStatus) -> Step {
    Step {
        current,
        index: current.index(),
        status,
    }
}

pub fn batch_item(index: usize, section: &str, task_ids: &[&str], status: BatchStatus) -> BatchItem {
    let mut item = BatchItem::new(index, section, task_ids.iter().map(|s| s.to_string()).collect());
    item.status = status;
    item
}

pub fn batch_tracking(items: Vec<BatchItem>) -> BatchTracking {
    BatchTracking {
        total: items.len(),
        current: 0,
        items,
    }
}

pub fn empty_dashboard_state() -> DashboardState {
    DashboardState::default()
}
