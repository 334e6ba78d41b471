//! Recursive directory copy.

use std::fs;
use std::path::Path;

use crate::{AppError, Result};

/// Counts of entries copied by [`copy_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    /// Regular files copied byte-for-byte.
    pub files: usize,
    /// Directories created.
    pub directories: usize,
    /// Symbolic links recreated.
    pub symlinks: usize,
}

/// Copy every entry under `src` into `dest`, preserving structure.
///
/// Hidden entries are copied like any other. `dest` is created if missing;
/// existing destination files are overwritten. On unix, symlinks are
/// recreated as symlinks rather than followed.
///
/// # Errors
///
/// Returns `AppError::Filesystem` naming the first entry that failed.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<MaterializeSummary> {
    let mut summary = MaterializeSummary::default();
    copy_dir(src, dest, &mut summary)?;
    Ok(summary)
}

fn copy_dir(src: &Path, dest: &Path, summary: &mut MaterializeSummary) -> Result<()> {
    fs::create_dir_all(dest).map_err(|err| fs_error("create", dest, &err))?;

    let entries = fs::read_dir(src).map_err(|err| fs_error("read", src, &err))?;
    for entry in entries {
        let entry = entry.map_err(|err| fs_error("read", src, &err))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|err| fs_error("inspect", &from, &err))?;

        if file_type.is_dir() {
            copy_dir(&from, &to, summary)?;
            summary.directories += 1;
        } else if file_type.is_symlink() {
            copy_symlink(&from, &to)?;
            summary.symlinks += 1;
        } else {
            fs::copy(&from, &to).map_err(|err| fs_error("copy", &from, &err))?;
            summary.files += 1;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let target = fs::read_link(from).map_err(|err| fs_error("read link", from, &err))?;
    if fs::symlink_metadata(to).is_ok() {
        fs::remove_file(to).map_err(|err| fs_error("replace", to, &err))?;
    }
    std::os::unix::fs::symlink(&target, to).map_err(|err| fs_error("link", to, &err))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|err| fs_error("copy", from, &err))
}

fn fs_error(action: &str, path: &Path, err: &std::io::Error) -> AppError {
    AppError::Filesystem(format!("failed to {action} {}: {err}", path.display()))
}
