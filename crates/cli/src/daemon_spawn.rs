//! Spawns and probes the `loomd` supervisor process, grounded on the
//! teacher's `cli/src/daemon_process.rs` (`start_daemon_background`,
//! `find_ojd_binary`, `process_exists`) — the socket-readiness probe is
//! replaced with a lock-file probe since this workspace has no daemon
//! socket protocol (§6: the daemon and CLI share state purely through
//! files).

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use loom_adapters::process;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonSpawnError {
    #[error("failed to launch loomd: {0}")]
    Launch(String),
    #[error("loomd did not become ready within the startup timeout")]
    NotReady,
}

/// Locate the `loomd` binary: an explicit override, then a sibling of the
/// running `loom` executable, then bare `loomd` resolved via `PATH`.
pub fn find_loomd_binary() -> PathBuf {
    if let Ok(path) = std::env::var("LOOM_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let sibling = dir.join("loomd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("loomd")
}

/// Launch `loomd <project_root> <orchestration_id>` detached from this
/// process's stdio, returning immediately without waiting for it to exit.
pub fn spawn_background(project_root: &Path, orchestration_id: &str) -> Result<(), DaemonSpawnError> {
    let binary = find_loomd_binary();
    Command::new(&binary)
        .arg(project_root)
        .arg(orchestration_id)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| DaemonSpawnError::Launch(e.to_string()))?;
    Ok(())
}

/// Poll the project's daemon lock file until it names a live PID, or give
/// up after `timeout`.
pub fn wait_until_ready(lock_path: &Path, timeout: Duration) -> Result<(), DaemonSpawnError> {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Ok(contents) = std::fs::read_to_string(lock_path) {
            if let Ok(pid) = contents.trim().parse::<u32>() {
                if process::process_exists(pid) {
                    return Ok(());
                }
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    Err(DaemonSpawnError::NotReady)
}
