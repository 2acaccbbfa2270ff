//! Shared types for the odd-jobs orchestrator core: IDs, the step/batch/
//! dashboard data model, the pure decision vocabulary, and the error enum
//! every fallible operation in the workspace returns.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod batch;
pub mod config;
pub mod dashboard_state;
pub mod decision;
pub mod error;
pub mod id;
pub mod ids;
pub mod recovery;
pub mod step;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use batch::{BatchItem, BatchStatus, BatchTracking};
pub use config::{Budget, OrchestrationConfig};
pub use dashboard_state::{
    ActiveOrchestration, Cost, DashboardState, DecisionLogEntry, LastWorkflow,
    OrchestrationStatus, RecoveryContext,
};
pub use decision::{Action, Decision};
pub use error::{OjError, Result};
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use ids::{OrchestrationId, ProjectId, WorkflowId};
pub use recovery::{recovery_options_for, RecoveryCause};
pub use step::{Step, StepName, StepStatus};
pub use workflow::{WorkflowSnapshot, WorkflowStatus};
pub use dashboard_state::RecoveryOption;
