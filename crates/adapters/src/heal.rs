//! The auto-heal routine (C7-b): an external, black-box remediation step
//! invoked when a batch fails outright. Modeled as a trait so the engine's
//! heal coordinator never cares whether healing means another agent
//! subprocess, a scripted fixture, or something else entirely.

use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealResultStatus {
    Fixed,
    Partial,
    Failed,
}

#[derive(Debug, Clone)]
pub struct HealRequest {
    pub section: String,
    pub task_ids: Vec<String>,
    pub previous_workflow_id: Option<String>,
    pub session_id: Option<String>,
    pub healing_budget_usd: Option<f64>,
    pub project_root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct HealOutcome {
    pub success: bool,
    pub result_status: HealResultStatus,
    pub session_id: Option<String>,
    pub cost_usd: f64,
    pub duration_ms: u64,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait HealRoutine: Send + Sync + 'static {
    async fn heal(&self, request: HealRequest) -> HealOutcome;
}

/// Runs the healer as the same kind of agent subprocess the workflow
/// spawner launches, via the `heal` skill, passing the failing section
/// and task ids as context.
pub struct RealHealRoutine<C: crate::agent_cli::AgentCli> {
    agent_cli: C,
}

impl<C: crate::agent_cli::AgentCli> RealHealRoutine<C> {
    pub fn new(agent_cli: C) -> Self {
        Self { agent_cli }
    }
}

#[async_trait]
impl<C: crate::agent_cli::AgentCli> HealRoutine for RealHealRoutine<C> {
    async fn heal(&self, request: HealRequest) -> HealOutcome {
        use crate::agent_cli::SpawnRequest;
        use std::time::Instant;

        let started = Instant::now();
        let context = format!(
            "section={} tasks={}",
            request.section,
            request.task_ids.join(",")
        );
        let session_log_path = request.project_root.join(".state/heal-session.jsonl");
        let pids_path = request.project_root.join(".state/heal-pids");

        let spawn_result = self
            .agent_cli
            .spawn(SpawnRequest {
                skill: "heal".to_string(),
                context: Some(context),
                project_root: request.project_root.clone(),
                session_log_path,
                pids_path,
                env: vec![],
            })
            .await;

        let duration_ms = started.elapsed().as_millis() as u64;
        match spawn_result {
            Ok(_outcome) => HealOutcome {
                success: true,
                result_status: HealResultStatus::Partial,
                session_id: request.session_id,
                cost_usd: 0.0,
                duration_ms,
                error_message: None,
            },
            Err(err) => HealOutcome {
                success: false,
                result_status: HealResultStatus::Failed,
                session_id: None,
                cost_usd: 0.0,
                duration_ms,
                error_message: Some(err.to_string()),
            },
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHealRoutine;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{HealOutcome, HealRequest, HealResultStatus, HealRoutine};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Returns scripted outcomes in order, falling back to a `Failed`
    /// outcome once the script runs dry.
    #[derive(Clone)]
    pub struct FakeHealRoutine {
        inner: Arc<Mutex<FakeHealState>>,
    }

    #[derive(Default)]
    struct FakeHealState {
        scripted: VecDeque<HealOutcome>,
        requests: Vec<HealRequest>,
    }

    impl Default for FakeHealRoutine {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeHealRoutine {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeHealState::default())),
            }
        }

        pub fn push_outcome(&self, outcome: HealOutcome) {
            self.inner.lock().scripted.push_back(outcome);
        }

        pub fn requests(&self) -> Vec<HealRequest> {
            self.inner.lock().requests.clone()
        }
    }

    #[async_trait]
    impl HealRoutine for FakeHealRoutine {
        async fn heal(&self, request: HealRequest) -> HealOutcome {
            let mut inner = self.inner.lock();
            inner.requests.push(request);
            inner.scripted.pop_front().unwrap_or(HealOutcome {
                success: false,
                result_status: HealResultStatus::Failed,
                session_id: None,
                cost_usd: 0.0,
                duration_ms: 0,
                error_message: Some("no scripted outcome".to_string()),
            })
        }
    }
}

#[cfg(test)]
#[path = "heal_tests.rs"]
mod tests;
