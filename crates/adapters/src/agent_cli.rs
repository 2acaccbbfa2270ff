//! Agent subprocess launcher (C5's spawn mechanics).
//!
//! `AgentCli` abstracts over how a skill actually gets run as a child
//! process, so the spawner can be tested against `FakeAgentCli` without
//! ever forking. The real implementation launches the configured agent
//! binary with `tokio::process::Command`, piping stdio to the session
//! log path the caller supplies, and recovers the agent's own PID from a
//! `pids` file the child writes back once it has session info of its
//! own — the same two-PID model `health.rs` checks liveness against.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentCliError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("signal failed: {0}")]
    SignalFailed(String),
}

/// Everything needed to launch one workflow's agent process.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub skill: String,
    pub context: Option<String>,
    pub project_root: PathBuf,
    pub session_log_path: PathBuf,
    pub pids_path: PathBuf,
    pub env: Vec<(String, String)>,
}

/// PIDs recorded for a freshly spawned workflow.
#[derive(Debug, Clone, Copy)]
pub struct SpawnOutcome {
    pub launcher_pid: u32,
    pub agent_pid: u32,
}

#[async_trait]
pub trait AgentCli: Send + Sync + 'static {
    async fn spawn(&self, request: SpawnRequest) -> Result<SpawnOutcome, AgentCliError>;
    async fn terminate(&self, launcher_pid: u32, agent_pid: u32) -> Result<(), AgentCliError>;
}

/// Launches the agent binary named by `LOOM_AGENT_BIN` (default `claude`),
/// with the skill name and optional context as arguments, stdio redirected
/// to `session_log_path`, and working directory set to `project_root`.
pub struct RealAgentCli {
    binary: String,
}

impl RealAgentCli {
    pub fn new() -> Self {
        let binary = std::env::var("LOOM_AGENT_BIN").unwrap_or_else(|_| "claude".to_string());
        Self { binary }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// Read back the agent's own PID from the `pids` file the child writes
    /// once it knows its session id. The file holds one integer per line;
    /// the first line is the agent PID. Retries briefly since the child
    /// may not have written the file yet at the instant we check.
    async fn read_agent_pid(pids_path: &Path) -> Option<u32> {
        for _ in 0..20 {
            if let Ok(contents) = tokio::fs::read_to_string(pids_path).await {
                if let Some(first_line) = contents.lines().next() {
                    if let Ok(pid) = first_line.trim().parse::<u32>() {
                        return Some(pid);
                    }
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        None
    }
}

impl Default for RealAgentCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentCli for RealAgentCli {
    async fn spawn(&self, request: SpawnRequest) -> Result<SpawnOutcome, AgentCliError> {
        use std::process::Stdio;
        use tokio::process::Command;

        let log_file = std::fs::File::create(&request.session_log_path)
            .map_err(|e| AgentCliError::SpawnFailed(e.to_string()))?;
        let log_file_err = log_file
            .try_clone()
            .map_err(|e| AgentCliError::SpawnFailed(e.to_string()))?;

        let mut command = Command::new(&self.binary);
        command
            .arg(&request.skill)
            .current_dir(&request.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_file_err));

        if let Some(context) = &request.context {
            command.arg(context);
        }
        for (key, value) in &request.env {
            command.env(key, value);
        }
        command.env("LOOM_PIDS_FILE", &request.pids_path);

        let child = command
            .spawn()
            .map_err(|e| AgentCliError::SpawnFailed(e.to_string()))?;
        let launcher_pid = child
            .id()
            .ok_or_else(|| AgentCliError::SpawnFailed("child exited before PID capture".into()))?;

        tokio::spawn(reap_child(child));

        let agent_pid = Self::read_agent_pid(&request.pids_path)
            .await
            .unwrap_or(launcher_pid);

        Ok(SpawnOutcome {
            launcher_pid,
            agent_pid,
        })
    }

    async fn terminate(&self, launcher_pid: u32, agent_pid: u32) -> Result<(), AgentCliError> {
        crate::process::terminate(launcher_pid);
        if agent_pid != launcher_pid {
            crate::process::terminate(agent_pid);
        }
        Ok(())
    }
}

/// Detached wait so the child doesn't become a zombie once its handle is
/// dropped; the spawner tracks liveness via PID polling, not exit status.
async fn reap_child(mut child: tokio::process::Child) {
    let _ = child.wait().await;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{AgentCliCall, FakeAgentCli};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{AgentCli, AgentCliError, SpawnOutcome, SpawnRequest};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct AgentCliCall {
        pub skill: String,
        pub context: Option<String>,
    }

    #[derive(Default)]
    struct FakeAgentCliState {
        calls: Vec<AgentCliCall>,
        terminated: Vec<(u32, u32)>,
        next_pid: u32,
        spawn_error: Option<String>,
    }

    /// Records spawn/terminate calls and hands out monotonically increasing
    /// fake PIDs, so runner/spawner tests can assert on linkage without
    /// forking real processes.
    #[derive(Clone)]
    pub struct FakeAgentCli {
        inner: Arc<Mutex<FakeAgentCliState>>,
    }

    impl Default for FakeAgentCli {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeAgentCli {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeAgentCliState {
                    next_pid: 1000,
                    ..Default::default()
                })),
            }
        }

        pub fn calls(&self) -> Vec<AgentCliCall> {
            self.inner.lock().calls.clone()
        }

        pub fn terminated(&self) -> Vec<(u32, u32)> {
            self.inner.lock().terminated.clone()
        }

        pub fn set_spawn_error(&self, message: impl Into<String>) {
            self.inner.lock().spawn_error = Some(message.into());
        }
    }

    #[async_trait]
    impl AgentCli for FakeAgentCli {
        async fn spawn(&self, request: SpawnRequest) -> Result<SpawnOutcome, AgentCliError> {
            let mut inner = self.inner.lock();
            inner.calls.push(AgentCliCall {
                skill: request.skill.clone(),
                context: request.context.clone(),
            });
            if let Some(message) = inner.spawn_error.take() {
                return Err(AgentCliError::SpawnFailed(message));
            }
            let pid = inner.next_pid;
            inner.next_pid += 1;
            Ok(SpawnOutcome {
                launcher_pid: pid,
                agent_pid: pid,
            })
        }

        async fn terminate(&self, launcher_pid: u32, agent_pid: u32) -> Result<(), AgentCliError> {
            self.inner.lock().terminated.push((launcher_pid, agent_pid));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "agent_cli_tests.rs"]
mod tests;
