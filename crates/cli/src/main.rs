//! `loom`: the CLI surface for the orchestrator (§10.4, C9). Subcommands
//! map one-to-one onto the `start/status/cancel/handleRecovery` operations
//! named across §4-§7; state is read and written directly against the
//! project's `.state/workflows/` files rather than through a daemon RPC
//! protocol, since the daemon and CLI already share that state as the
//! single source of truth (§6).

mod commands;
mod daemon_spawn;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{RecoverAction, StartArgs};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "loom", about = "Autonomous multi-phase workflow orchestrator")]
struct Cli {
    /// Project root to operate on (defaults to the current directory).
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Output format for `status`.
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new orchestration, spawning the supervisor daemon.
    Start(StartArgs),
    /// Show the current orchestration's state.
    Status,
    /// Cancel the active orchestration.
    Cancel,
    /// Apply a recovery action to an orchestration in `needs_attention`.
    Recover {
        #[arg(value_enum)]
        action: RecoverAction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_root = commands::resolve_project_root(cli.project)?;

    match cli.command {
        Commands::Start(args) => commands::start(project_root, args, cli.format).await,
        Commands::Status => commands::status(project_root, cli.format).await,
        Commands::Cancel => commands::cancel(project_root).await,
        Commands::Recover { action } => commands::recover(project_root, action).await,
    }
}
