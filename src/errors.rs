//! Error types shared across the provisioning pipeline.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Exit status reported for every fatal failure that carries no child code.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Application error enumeration covering all pipeline failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Session token or owner number has the wrong shape.
    ///
    /// Recovered locally by re-prompting on the interactive path.
    Format(String),
    /// Template source unreachable or staging directory unusable.
    Fetch(String),
    /// Permission, space, or other failure while cleaning, copying, or writing.
    Filesystem(String),
    /// An external command could not be started or exited non-zero.
    Process {
        /// Human-readable command line.
        command: String,
        /// Exit code of the child, if it exited normally.
        code: Option<i32>,
    },
    /// Configuration parsing or validation failure.
    Config(String),
    /// Terminal channel failure, including end of input.
    Io(String),
    /// Another provisioning run holds the lock for the same session token.
    Lock(String),
}

impl AppError {
    /// Process exit status to report for this error.
    ///
    /// Process failures propagate the child's exit code; everything else
    /// (and a child killed by a signal) maps to [`FAILURE_EXIT_CODE`].
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Process {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => FAILURE_EXIT_CODE,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(msg) => write!(f, "format: {msg}"),
            Self::Fetch(msg) => write!(f, "fetch: {msg}"),
            Self::Filesystem(msg) => write!(f, "filesystem: {msg}"),
            Self::Process {
                command,
                code: Some(code),
            } => write!(f, "process: `{command}` exited with code {code}"),
            Self::Process {
                command,
                code: None,
            } => write!(f, "process: `{command}` terminated without an exit code"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Lock(msg) => write!(f, "lock: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Filesystem(format!("credential record encoding failed: {err}"))
    }
}
