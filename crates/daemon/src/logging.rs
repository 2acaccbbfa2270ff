//! `tracing` setup for the supervisor process (§10.1), grounded on the
//! teacher's `daemon/src/main.rs::setup_logging`: a non-blocking file
//! appender plus an `EnvFilter` defaulting to `info`.

use std::path::Path;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::lifecycle::LifecycleError;

pub fn setup_logging(log_path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = log_path.file_name().ok_or_else(|| {
        LifecycleError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "log path has no file name",
        ))
    })?;
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
