//! `config.env` serialization.
//!
//! Lines are `KEY=VALUE` joined by `\n`, in insertion order, with no
//! trailing newline and no escaping. A value containing a line break
//! cannot round-trip; such values are still written verbatim and reported.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::models::instance_config::InstanceConfig;
use crate::{AppError, Result};

/// File name of the generated configuration inside an instance directory.
pub const CONFIG_FILE_NAME: &str = "config.env";

/// Render `config` as `KEY=VALUE` lines.
#[must_use]
pub fn render(config: &InstanceConfig) -> String {
    config
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `KEY=VALUE` lines.
///
/// Splits on the first `=`; blank lines, `#` comments, and lines without
/// `=` are skipped. A later duplicate key replaces the earlier value.
#[must_use]
pub fn parse_env(text: &str) -> InstanceConfig {
    let mut config = InstanceConfig::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            config.set(key, value);
        }
    }
    config
}

/// Write `config` to `<instance_dir>/config.env`, replacing any existing file.
///
/// The content goes to a temporary file in the same directory first and is
/// then renamed into place, so a reader never sees a partial file. The file
/// holds the session token and owner number; on unix it is owner-only
/// (`0600`).
///
/// # Errors
///
/// Returns `AppError::Filesystem` if the temporary file cannot be written
/// or persisted.
pub fn write_config(instance_dir: &Path, config: &InstanceConfig) -> Result<PathBuf> {
    for (key, value) in config.iter() {
        if value.contains('\n') || value.contains('\r') {
            warn!(key, "config value contains a line break and will not round-trip");
        }
    }

    let target = instance_dir.join(CONFIG_FILE_NAME);
    let content = render(config);

    let mut tmp = NamedTempFile::new_in(instance_dir)
        .map_err(|err| AppError::Filesystem(format!("failed to create temporary file: {err}")))?;
    tmp.write_all(content.as_bytes())
        .map_err(|err| AppError::Filesystem(format!("failed to write temporary file: {err}")))?;
    tmp.persist(&target).map_err(|err| {
        AppError::Filesystem(format!(
            "failed to persist config to {}: {err}",
            target.display()
        ))
    })?;

    info!(path = %target.display(), keys = config.len(), "instance config written");
    Ok(target)
}
