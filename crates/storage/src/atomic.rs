//! Generic atomic JSON document read/write, following the teacher's
//! `Snapshot::save` / `Snapshot::load` pattern exactly: write to
//! `path.with_extension("tmp")`, `sync_all()`, then `fs::rename`; a corrupt
//! read is rotated to `.bak` (keeping up to 3 generations) rather than
//! propagating the parse error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AtomicIoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AtomicIoError> for loom_core::OjError {
    fn from(err: AtomicIoError) -> Self {
        match err {
            AtomicIoError::Io(e) => loom_core::OjError::Io(e),
            AtomicIoError::Json(e) => loom_core::OjError::Json(e),
        }
    }
}

/// Write `value` atomically: create parent dirs, write through a
/// `BufWriter` to a `.tmp` sibling, `sync_all`, then rename over `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AtomicIoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read a JSON document, tolerating absence and corruption.
///
/// - Missing file: `Ok(None)`.
/// - Corrupt file: rotated to `.bak` (oldest of up to [`MAX_BAK_FILES`]
///   pruned), `Ok(None)` returned so the caller falls back to defaults.
pub fn read_json_safe<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AtomicIoError> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    match serde_json::from_reader(reader) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let bak_path = rotate_bak_path(path);
            warn!(
                error = %e,
                path = %path.display(),
                bak = %bak_path.display(),
                "corrupt state document, moving to .bak and falling back to defaults",
            );
            fs::rename(path, &bak_path)?;
            Ok(None)
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
