//! External command execution.
//!
//! Commands run in a given working directory with the provisioner's
//! standard streams inherited, and the caller blocks until they exit.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{error, info, info_span, Instrument};

use crate::config::CommandConfig;
use crate::{AppError, Result};

/// Spawn `command` inside `cwd` with inherited stdio.
///
/// `envs` are added on top of the inherited environment.
///
/// # Errors
///
/// Returns `AppError::Process` without an exit code if the program cannot
/// be started.
pub fn spawn_inherited(command: &CommandConfig, cwd: &Path, envs: &[(&str, &str)]) -> Result<Child> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let child = cmd.spawn().map_err(|err| {
        error!(command = %command.display(), cwd = %cwd.display(), %err, "failed to spawn");
        AppError::Process {
            command: command.display(),
            code: None,
        }
    })?;

    info!(
        command = %command.display(),
        pid = child.id().unwrap_or(0),
        "process started"
    );
    Ok(child)
}

/// Wait for `child` and return its exit code.
///
/// A child terminated by a signal reports `None`.
///
/// # Errors
///
/// Returns `AppError::Process` if waiting on the child fails.
pub async fn wait_for(child: &mut Child, command: &CommandConfig) -> Result<Option<i32>> {
    let status = child.wait().await.map_err(|err| {
        error!(command = %command.display(), %err, "failed to wait on child");
        AppError::Process {
            command: command.display(),
            code: None,
        }
    })?;
    info!(command = %command.display(), code = ?status.code(), "process exited");
    Ok(status.code())
}

/// Run `command` to completion, failing unless it exits with status 0.
///
/// # Errors
///
/// Returns `AppError::Process` if the program cannot be spawned or exits
/// unsuccessfully (carrying the child's code when known).
pub async fn run_inherited(
    command: &CommandConfig,
    cwd: &Path,
    envs: &[(&str, &str)],
) -> Result<()> {
    let span = info_span!("run_command", command = %command.display(), cwd = %cwd.display());
    run_to_completion(command, cwd, envs).instrument(span).await
}

async fn run_to_completion(
    command: &CommandConfig,
    cwd: &Path,
    envs: &[(&str, &str)],
) -> Result<()> {
    let mut child = spawn_inherited(command, cwd, envs)?;
    match wait_for(&mut child, command).await? {
        Some(0) => Ok(()),
        code => Err(AppError::Process {
            command: command.display(),
            code,
        }),
    }
}
