//! Upgrade and downgrade command implementations

use anyhow::Result;
use muss_document::migrate::{
    FALLBACK_SESSION_STAMP, downgrade_to_uss, session_stamp_from_timestamp, upgrade_to_muss,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{read_input, write_output};

/// Execute the upgrade command
pub fn upgrade(file: &Path, output: Option<&str>, session_id: Option<&str>) -> Result<()> {
    let content = read_input(file)?;
    let stamp = match session_id {
        Some(stamp) => stamp.to_string(),
        None => session_stamp_from_timestamp(&content)
            .unwrap_or_else(|| FALLBACK_SESSION_STAMP.to_string()),
    };
    debug!(%stamp, file = %file.display(), "upgrading to MUSS");
    let upgraded = upgrade_to_muss(&content, &stamp);
    write_output(output, suffixed(file, "muss"), &upgraded)
}

/// Execute the downgrade command
pub fn downgrade(file: &Path, output: Option<&str>) -> Result<()> {
    let content = read_input(file)?;
    debug!(file = %file.display(), "downgrading to USS");
    write_output(output, suffixed(file, "uss"), &downgrade_to_uss(&content))
}

/// `notes.md` becomes `notes.<tag>.md`.
fn suffixed(file: &Path, tag: &str) -> PathBuf {
    let stem = file.file_stem().map_or_else(
        || "artifact".to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    );
    let name = match file.extension() {
        Some(ext) => format!("{}.{}.{}", stem, tag, ext.to_string_lossy()),
        None => format!("{}.{}", stem, tag),
    };
    file.with_file_name(name)
}
