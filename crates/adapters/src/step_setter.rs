//! The step-state setter boundary (§4.2, §9 Open Question #2): the core
//! writes `step-state.json` only through this trait, shelling out to the
//! external setter utility rather than calling `StepStateStore::write`
//! directly, because the setter validates the step transition the same way
//! external sub-commands do. Mirrors the teacher's pattern of invoking its
//! own `oj` binary recursively (`spawn.rs`'s `OJ_DAEMON_BINARY` forwarding)
//! rather than duplicating a second writer for state another component
//! owns.

use async_trait::async_trait;
use loom_core::{Step, StepName, StepStatus};
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum StepSetterError {
    #[error("step setter exited with status {0}")]
    NonZeroExit(i32),
    #[error("step setter failed to launch: {0}")]
    Launch(String),
}

#[async_trait]
pub trait StepSetter: Send + Sync + 'static {
    async fn set_step(
        &self,
        project_root: &PathBuf,
        current: StepName,
        status: StepStatus,
        index: u32,
    ) -> Result<(), StepSetterError>;
}

/// Shells out to the binary named by `LOOM_STEP_SETTER_BIN` (default
/// `oj-step-setter`) with `<current> <status> <index>` as positional
/// arguments, matching the CLI-subcommand-as-validator idiom the teacher
/// uses for its own recursive `oj` invocations.
pub struct RealStepSetter {
    binary: String,
}

impl RealStepSetter {
    pub fn new() -> Self {
        let binary = std::env::var("LOOM_STEP_SETTER_BIN").unwrap_or_else(|_| "oj-step-setter".to_string());
        Self { binary }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for RealStepSetter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepSetter for RealStepSetter {
    async fn set_step(
        &self,
        project_root: &PathBuf,
        current: StepName,
        status: StepStatus,
        index: u32,
    ) -> Result<(), StepSetterError> {
        let step = Step {
            current,
            index,
            status,
        };
        let current_arg = serde_json::to_string(&step.current).unwrap_or_default();
        let status_arg = serde_json::to_string(&step.status).unwrap_or_default();

        let output = Command::new(&self.binary)
            .arg("set-step")
            .arg(current_arg.trim_matches('"'))
            .arg(status_arg.trim_matches('"'))
            .arg(index.to_string())
            .current_dir(project_root)
            .output()
            .await
            .map_err(|e| StepSetterError::Launch(e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(StepSetterError::NonZeroExit(output.status.code().unwrap_or(-1)))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStepSetter;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{StepSetter, StepSetterError};
    use async_trait::async_trait;
    use loom_core::{StepName, StepStatus};
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct StepSetterCall {
        pub current: StepName,
        pub status: StepStatus,
        pub index: u32,
    }

    #[derive(Default)]
    struct FakeStepSetterState {
        calls: Vec<StepSetterCall>,
        fail_next: bool,
    }

    /// Records every call so engine tests can assert the exact transitions
    /// requested, without shelling out to anything.
    #[derive(Clone)]
    pub struct FakeStepSetter {
        inner: Arc<Mutex<FakeStepSetterState>>,
    }

    impl Default for FakeStepSetter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeStepSetter {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeStepSetterState::default())),
            }
        }

        pub fn calls(&self) -> Vec<StepSetterCall> {
            self.inner.lock().calls.clone()
        }

        pub fn fail_next_call(&self) {
            self.inner.lock().fail_next = true;
        }
    }

    #[async_trait]
    impl StepSetter for FakeStepSetter {
        async fn set_step(
            &self,
            _project_root: &PathBuf,
            current: StepName,
            status: StepStatus,
            index: u32,
        ) -> Result<(), StepSetterError> {
            let mut inner = self.inner.lock();
            if inner.fail_next {
                inner.fail_next = false;
                return Err(StepSetterError::NonZeroExit(1));
            }
            inner.calls.push(StepSetterCall {
                current,
                status,
                index,
            });
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "step_setter_tests.rs"]
mod tests;
