//! Externally staged credential records.
//!
//! The producer is trusted: values are used without validation. The record
//! is single-use and is deleted as soon as it has been read, whether or not
//! it parses.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::models::identity::SessionIdentity;
use crate::namespace::remove_path;

#[derive(Debug, Deserialize)]
struct PreloadedRecord {
    session: String,
    owner: String,
}

/// Read and delete the record at `path`.
///
/// Returns `None` when no record exists or it is unusable (unreadable, not
/// JSON, missing or blank `session`/`owner`); those cases are logged and the
/// caller falls back to prompting.
#[must_use]
pub fn consume(path: &Path) -> Option<SessionIdentity> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), %err, "preloaded credentials unreadable");
            None
        }
    };

    if let Err(err) = remove_path(path) {
        warn!(path = %path.display(), %err, "failed to delete preloaded credentials");
    }

    let record: PreloadedRecord = match serde_json::from_str(&raw?) {
        Ok(record) => record,
        Err(err) => {
            warn!(path = %path.display(), %err, "preloaded credentials malformed; prompting instead");
            return None;
        }
    };

    if record.session.trim().is_empty() || record.owner.trim().is_empty() {
        warn!(path = %path.display(), "preloaded credentials incomplete; prompting instead");
        return None;
    }

    info!(path = %path.display(), "using preloaded credentials");
    Some(SessionIdentity::trusted(record.session, record.owner))
}
