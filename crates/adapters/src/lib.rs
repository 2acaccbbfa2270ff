//! External collaborators the orchestration core talks to: process
//! liveness, session-journal classification (together forming the
//! process-health supervisor, C3), the agent CLI spawn boundary (C5), the
//! heal routine (C7), the step-state setter utility, and the file-event
//! subscriber the runner loop wakes on.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod agent_cli;
pub mod health;
pub mod heal;
pub mod notify_watch;
pub mod process;
pub mod session_journal;
pub mod step_setter;

pub use agent_cli::{AgentCli, RealAgentCli, SpawnOutcome, SpawnRequest};
pub use health::{classify_workflow, WorkflowHealth};
pub use heal::{HealOutcome, HealRequest, HealRoutine, HealResultStatus, RealHealRoutine};
pub use notify_watch::{FileEvent, FileEventCategory, FileEventSubscriber};
pub use process::process_exists;
pub use session_journal::{classify_session, SessionClassification};
pub use step_setter::{RealStepSetter, StepSetter};

#[cfg(feature = "test-support")]
pub use agent_cli::FakeAgentCli;
#[cfg(feature = "test-support")]
pub use heal::FakeHealRoutine;
#[cfg(feature = "test-support")]
pub use notify_watch::FakeFileEventSubscriber;
#[cfg(feature = "test-support")]
pub use step_setter::FakeStepSetter;
