//! Per-session filesystem namespacing.
//!
//! Every path a run touches (instance directory, staging checkout,
//! credential file, lock file) is keyed by the same slug derived from the
//! session token, so runs for different tokens never share a path.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::validate::SESSION_PREFIX;
use crate::{AppError, Result};

/// Derive the filesystem-safe slug for a session token.
///
/// Removes [`SESSION_PREFIX`] when present, then drops every character
/// outside `[A-Za-z0-9_-]`.
#[must_use]
pub fn session_slug(session_token: &str) -> String {
    session_token
        .strip_prefix(SESSION_PREFIX)
        .unwrap_or(session_token)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Instance directory for a session token: `<root>/<prefix><slug>`.
#[must_use]
pub fn resolve_instance_dir(root: &Path, prefix: &str, session_token: &str) -> PathBuf {
    root.join(format!("{prefix}{}", session_slug(session_token)))
}

/// Staging directory for a session token: `<staging_root>/staging-<slug>`.
#[must_use]
pub fn staging_dir(staging_root: &Path, session_token: &str) -> PathBuf {
    staging_root.join(format!("staging-{}", session_slug(session_token)))
}

/// Per-session credential file: `<dir>/creds-<slug>.json`.
#[must_use]
pub fn credential_file(credentials_dir: &Path, session_token: &str) -> PathBuf {
    credentials_dir.join(format!("creds-{}.json", session_slug(session_token)))
}

/// Advisory lock file: `<staging_root>/<slug>.lock`.
#[must_use]
pub fn lock_file(staging_root: &Path, session_token: &str) -> PathBuf {
    staging_root.join(format!("{}.lock", session_slug(session_token)))
}

/// Remove whatever exists at `path`, recursively and forcibly.
///
/// A missing path is not an error. Symlinks are unlinked, never followed.
///
/// # Errors
///
/// Returns `AppError::Filesystem` if the entry exists but cannot be removed.
pub fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(AppError::Filesystem(format!(
                "cannot inspect {}: {err}",
                path.display()
            )))
        }
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => {
            debug!(path = %path.display(), "removed");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(AppError::Filesystem(format!(
            "failed to remove {}: {err}",
            path.display()
        ))),
    }
}

/// Guarantee that `path` exists as an empty directory.
///
/// Any existing entry is destroyed first, then the directory (and its
/// parents) is created.
///
/// # Errors
///
/// Returns `AppError::Filesystem` if removal or creation fails.
pub fn ensure_clean(path: &Path) -> Result<()> {
    let existed = fs::symlink_metadata(path).is_ok();
    remove_path(path)?;
    fs::create_dir_all(path).map_err(|err| {
        AppError::Filesystem(format!("failed to create {}: {err}", path.display()))
    })?;
    info!(path = %path.display(), existed, "namespace prepared");
    Ok(())
}
