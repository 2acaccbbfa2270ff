//! Raw-PID liveness checks, grounded in the teacher's
//! `daemon_process.rs::process_exists` idiom: shell out to the system
//! `kill` binary rather than link `libc`/`nix` directly, since nothing
//! else in this workspace needs a signals dependency.

use std::process::{Command, Stdio};

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Whether a process with the given PID can be signalled (a null signal,
/// `kill -0`). Absence of the process, or any inability to signal it
/// (including permission errors), is treated as "dead" — the supervisor
/// only cares about the binary live/not-live distinction.
pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

/// Send SIGTERM.
pub fn terminate(pid: u32) -> bool {
    kill_signal("-TERM", pid)
}

/// Send SIGKILL, for the harder follow-up signal after a grace period.
pub fn kill(pid: u32) -> bool {
    kill_signal("-9", pid)
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
