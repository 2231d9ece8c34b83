//! Command implementations for the muss CLI
//!
//! Each command module handles file I/O and delegates to muss-document or
//! muss-validation for the actual work.

pub mod convert;
pub mod migrate;
pub mod validate;

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Marker for `--output -`
const STDOUT: &str = "-";

pub(crate) fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write `content` to `output`, or to `default` when no output was given.
pub(crate) fn write_output(output: Option<&str>, default: PathBuf, content: &str) -> Result<()> {
    let path = match output {
        Some(STDOUT) => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
            return Ok(());
        }
        Some(path) => PathBuf::from(path),
        None => default,
    };
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
