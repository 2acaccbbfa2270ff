//! Unified error type for fallible core/storage/engine operations. `decide()`
//! itself is the one exception — it is total and never returns `Result`
//! (§4.4, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OjError {
    #[error("state io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("heal routine failed: {0}")]
    Heal(String),

    #[error("step-state setter failed: {0}")]
    StepSetter(String),

    #[error("reconciliation failed: {0}")]
    Reconcile(String),
}

pub type Result<T> = std::result::Result<T, OjError>;
