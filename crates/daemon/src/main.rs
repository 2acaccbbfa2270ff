//! `loomd`: the per-project supervisor process. Not meant to be invoked
//! directly — `loom start` spawns it in the background and tracks its PID
//! the way the teacher's `oj` CLI spawns and tracks `ojd`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

use std::path::PathBuf;

use loom_core::OrchestrationId;
use loom_daemon::lifecycle::{self, DaemonPaths, LifecycleError};
use loom_daemon::supervisor;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let mut args = std::env::args().skip(1);
    let (project_root, orchestration_id) = match (args.next(), args.next()) {
        (Some(root), Some(id)) => (PathBuf::from(root), OrchestrationId::new(id)),
        _ => {
            eprintln!("usage: loomd <project-root> <orchestration-id>");
            return std::process::ExitCode::FAILURE;
        }
    };

    let paths = DaemonPaths::for_project(&project_root);
    lifecycle::rotate_log_if_needed(&paths.log_path);
    if let Err(err) = lifecycle::write_startup_marker(&paths) {
        eprintln!("failed to write startup marker: {err}");
        return std::process::ExitCode::FAILURE;
    }

    let _log_guard = match loom_daemon::logging::setup_logging(&paths.log_path) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to set up logging: {err}");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(%orchestration_id, project_root = %project_root.display(), "starting loomd");

    let _lock = match lifecycle::acquire_lock(&paths) {
        Ok(lock) => lock,
        Err(err @ LifecycleError::LockFailed(_)) => {
            lifecycle::write_startup_error(&paths, &err);
            eprintln!("loomd is already running for this project");
            return std::process::ExitCode::FAILURE;
        }
        Err(err) => {
            lifecycle::write_startup_error(&paths, &err);
            eprintln!("failed to start loomd: {err}");
            return std::process::ExitCode::FAILURE;
        }
    };

    println!("READY");

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(err) => {
            tracing::error!(%err, "failed to install SIGTERM handler");
            return std::process::ExitCode::FAILURE;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(err) => {
            tracing::error!(%err, "failed to install SIGINT handler");
            return std::process::ExitCode::FAILURE;
        }
    };

    tokio::select! {
        _ = supervisor::run_supervisor(project_root, orchestration_id) => {
            info!("runner loop exited, stopping");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, stopping without touching orchestration state");
        }
        _ = sigint.recv() => {
            info!("received SIGINT, stopping without touching orchestration state");
        }
    }

    std::process::ExitCode::SUCCESS
}
