//! Daemon lifecycle management: lock acquisition, log rotation, and
//! per-project configuration loading (§10.3). Grounded on the teacher's
//! `daemon/src/lifecycle.rs::Config::load` / `startup_inner` shape, scaled
//! down from a single global daemon serving every project to one process
//! per project (§5: "one supervisor process per dashboard instance").

use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use loom_core::config::{Budget, OrchestrationConfig};
use thiserror::Error;

/// Paths the daemon process itself needs, separate from the
/// `.state/workflows/` layout `loom-storage` owns — the lock/log files
/// belong to the supervisor process, not to any one orchestration.
#[derive(Debug, Clone)]
pub struct DaemonPaths {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
}

impl DaemonPaths {
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let state_dir = project_root.as_ref().join(".state");
        Self {
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            state_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire daemon lock: another supervisor is already running for this project")]
    LockFailed(#[source] std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid orchestrate.toml: {0}")]
    Config(#[from] toml::de::Error),
}

/// Held for the supervisor process's lifetime; releases the exclusive
/// file lock and removes the PID file on drop, mirroring the teacher's
/// `DaemonState::shutdown` cleanup (minus the socket/version files this
/// workspace has no equivalent of).
pub struct LockGuard {
    _file: File,
    lock_path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lock_path);
    }
}

/// Acquire the project-scoped daemon lock, writing this process's PID into
/// it. Fails with [`LifecycleError::LockFailed`] if another supervisor
/// already holds it (teacher's `try_lock_exclusive` idiom).
pub fn acquire_lock(paths: &DaemonPaths) -> Result<LockGuard, LifecycleError> {
    std::fs::create_dir_all(&paths.state_dir)?;

    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.lock_path)?;
    file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut file = file;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;

    Ok(LockGuard {
        _file: file,
        lock_path: paths.lock_path.clone(),
    })
}

/// Startup marker prefix the CLI scans the log for when `loomd` fails
/// before logging is even set up (teacher's `STARTUP_MARKER_PREFIX`).
pub const STARTUP_MARKER_PREFIX: &str = "--- loomd: starting (pid: ";

pub fn write_startup_marker(paths: &DaemonPaths) -> Result<(), LifecycleError> {
    std::fs::create_dir_all(&paths.state_dir)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

pub fn write_startup_error(paths: &DaemonPaths, error: &(impl std::fmt::Display + ?Sized)) {
    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(&paths.log_path) else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start loomd: {error}");
}

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;
const MAX_ROTATED_LOGS: u32 = 3;

/// Shifts `daemon.log` -> `.1` -> `.2` -> `.3`, dropping the oldest.
/// Best-effort: rotation failures never block startup.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// CLI-flag overrides applied after the project-local TOML file, matching
/// §10.3's "CLI flags taking final precedence". `None` leaves the
/// TOML/default value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub auto_merge: Option<bool>,
    pub auto_heal_enabled: Option<bool>,
    pub max_heal_attempts: Option<u32>,
    pub pause_between_batches: Option<bool>,
    pub batch_size_fallback: Option<usize>,
    pub skip_design: Option<bool>,
    pub skip_analyze: Option<bool>,
    pub skip_implement: Option<bool>,
    pub skip_verify: Option<bool>,
    pub require_merge_gate: Option<bool>,
    pub additional_context: Option<String>,
    pub max_total_budget: Option<f64>,
}

/// Loads `OrchestrationConfig` the way the teacher's daemon loads its
/// `Config`: defaults via `serde(default)`, overridden by a project-local
/// TOML file, overridden again by CLI flags. The project-local file name
/// (`.oj/orchestrate.toml`) keeps the teacher's `.oj/`-prefixed convention.
pub struct Config;

impl Config {
    pub fn load(project_root: &Path, overrides: ConfigOverrides) -> Result<OrchestrationConfig, LifecycleError> {
        let toml_path = project_root.join(".oj").join("orchestrate.toml");
        let mut config = if toml_path.exists() {
            let contents = std::fs::read_to_string(&toml_path)?;
            toml::from_str::<OrchestrationConfig>(&contents)?
        } else {
            OrchestrationConfig::default()
        };

        apply_overrides(&mut config, overrides);
        Ok(config)
    }
}

fn apply_overrides(config: &mut OrchestrationConfig, overrides: ConfigOverrides) {
    if let Some(v) = overrides.auto_merge {
        config.auto_merge = v;
    }
    if let Some(v) = overrides.auto_heal_enabled {
        config.auto_heal_enabled = v;
    }
    if let Some(v) = overrides.max_heal_attempts {
        config.max_heal_attempts = v;
    }
    if let Some(v) = overrides.pause_between_batches {
        config.pause_between_batches = v;
    }
    if let Some(v) = overrides.batch_size_fallback {
        config.batch_size_fallback = v;
    }
    if let Some(v) = overrides.skip_design {
        config.skip_design = v;
    }
    if let Some(v) = overrides.skip_analyze {
        config.skip_analyze = v;
    }
    if let Some(v) = overrides.skip_implement {
        config.skip_implement = v;
    }
    if let Some(v) = overrides.skip_verify {
        config.skip_verify = v;
    }
    if let Some(v) = overrides.require_merge_gate {
        config.require_merge_gate = v;
    }
    if let Some(v) = overrides.additional_context {
        config.additional_context = v;
    }
    if let Some(v) = overrides.max_total_budget {
        config.budget = Budget {
            max_total: v,
            ..config.budget
        };
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
