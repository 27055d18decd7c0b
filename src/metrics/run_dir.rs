//! Timestamped run directories.
//!
//! Every training run gets its own directory named after the start time,
//! with the full hyperparameter set serialized to `params.json` so runs
//! stay reproducible and comparable after the fact.

use chrono::Local;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Create `base/<Mon_DD_YYYY_HHMMSS>/` and write `params.json` into it.
///
/// Appends a numeric suffix when two runs start within the same second.
pub fn create_run_dir<C: Serialize>(base: impl AsRef<Path>, params: &C) -> io::Result<PathBuf> {
    let stamp = Local::now().format("%b_%d_%Y_%H%M%S").to_string();

    let base = base.as_ref();
    let mut dir = base.join(&stamp);
    let mut suffix = 1;
    while dir.exists() {
        dir = base.join(format!("{}_{}", stamp, suffix));
        suffix += 1;
    }
    fs::create_dir_all(&dir)?;

    write_params(&dir, params)?;
    Ok(dir)
}

/// Serialize hyperparameters into `<dir>/params.json`.
pub fn write_params<C: Serialize>(dir: &Path, params: &C) -> io::Result<()> {
    let json = serde_json::to_string_pretty(params)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(dir.join("params.json"), json)
}
