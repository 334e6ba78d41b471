//! Advisory per-token lock.
//!
//! Two runs for the same session token would race on the namespace, the
//! staging checkout, and the credential file. The lock file is created with
//! `create_new` and records the owner PID; a lock whose owner is no longer
//! alive is considered stale and replaced.
//!
//! A lock carrying this process's own PID is live only while a guard for it
//! exists in this process. Otherwise it was left by an earlier process that
//! died without cleanup and happened to have the same PID.
//!
//! Liveness is checked with signal 0 on unix. Other platforms cannot check
//! liveness, so a lock held by another process there is always refused and
//! has to be removed by hand.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::{AppError, Result};

/// Lock files currently guarded by this process.
static HELD: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// RAII guard that removes the lock file on drop.
#[derive(Debug)]
pub struct TokenLock {
    path: PathBuf,
}

impl TokenLock {
    /// Acquire the lock at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Lock` if a live process holds the lock, or
    /// `AppError::Filesystem` if the lock file cannot be created.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                AppError::Filesystem(format!(
                    "failed to create lock directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        match Self::create(path) {
            Ok(lock) => Ok(lock),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                let holder = read_holder(path);
                if holder.is_some_and(|pid| holder_is_live(pid, path)) {
                    return Err(AppError::Lock(format!(
                        "another provisioning run (pid {}) holds {}",
                        holder.unwrap_or_default(),
                        path.display()
                    )));
                }

                warn!(path = %path.display(), ?holder, "replacing stale lock");
                let _ = fs::remove_file(path);
                Self::create(path).map_err(|err| lock_error(path, &err))
            }
            Err(err) => Err(lock_error(path, &err)),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut opts = OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts.open(path)?;
        write!(file, "{}", std::process::id())?;
        held().push(path.to_path_buf());
        debug!(path = %path.display(), "lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Location of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TokenLock {
    fn drop(&mut self) {
        held().retain(|entry| entry != &self.path);
        let _ = fs::remove_file(&self.path);
    }
}

fn held() -> MutexGuard<'static, Vec<PathBuf>> {
    HELD.lock().unwrap_or_else(PoisonError::into_inner)
}

fn holder_is_live(pid: u32, path: &Path) -> bool {
    if pid == std::process::id() {
        return held().iter().any(|entry| entry == path);
    }
    is_process_alive(pid)
}

fn lock_error(path: &Path, err: &std::io::Error) -> AppError {
    AppError::Filesystem(format!("failed to create lock {}: {err}", path.display()))
}

fn read_holder(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Whether a process with `pid` is still running.
///
/// Signal 0 performs the permission and existence checks without
/// delivering anything. Non-unix platforms report every holder as alive.
fn is_process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        match kill(Pid::from_raw(raw), None) {
            Ok(()) | Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}
