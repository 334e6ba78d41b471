//! Per-session credential file written for later pipeline steps.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::models::identity::SessionIdentity;
use crate::{AppError, Result};

/// Write `identity` as JSON to `path`, creating parent directories.
///
/// The file is created through a temporary file, so on unix it carries
/// owner-only permissions. The JSON shape matches the preloaded record.
///
/// # Errors
///
/// Returns `AppError::Filesystem` if the directory or file cannot be written.
pub fn write(path: &Path, identity: &SessionIdentity) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| AppError::Filesystem("credential path has no parent directory".into()))?;
    std::fs::create_dir_all(parent).map_err(|err| {
        AppError::Filesystem(format!(
            "failed to create credentials directory {}: {err}",
            parent.display()
        ))
    })?;

    let json = serde_json::to_string_pretty(identity)?;

    let mut tmp = NamedTempFile::new_in(parent)
        .map_err(|err| AppError::Filesystem(format!("failed to create temporary file: {err}")))?;
    tmp.write_all(json.as_bytes())
        .map_err(|err| AppError::Filesystem(format!("failed to write temporary file: {err}")))?;
    tmp.persist(path).map_err(|err| {
        AppError::Filesystem(format!(
            "failed to persist credentials to {}: {err}",
            path.display()
        ))
    })?;

    debug!(path = %path.display(), "session credentials written");
    Ok(())
}
