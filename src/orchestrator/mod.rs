//! Provisioning lifecycle.
//!
//! Covers the pipeline state machine, the per-run context threaded through
//! each stage, the advisory per-token lock, and the pipeline driver.

pub mod lock;
pub mod pipeline;

use std::path::PathBuf;

use crate::config::GlobalConfig;
use crate::models::identity::SessionIdentity;
use crate::namespace;
use crate::{AppError, Result};

pub use pipeline::{Outcome, ProvisionReport, Provisioner};

/// Environment variable naming the per-session credential file for the
/// dependency install step.
pub const CREDENTIALS_ENV: &str = "PROVISION_CREDENTIALS_FILE";

/// Pipeline states, in execution order, followed by the two terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    /// Obtain the session identity.
    ResolveIdentity,
    /// Reset the instance directory.
    PrepareNamespace,
    /// Fill the staging directory from the template source.
    FetchTemplate,
    /// Copy staging into the instance directory.
    Materialize,
    /// Write `config.env`.
    WriteConfig,
    /// Run the dependency install command.
    InstallDependencies,
    /// Delete credential files.
    CleanupCredentials,
    /// Launch the runtime.
    StartRuntime,
    /// Runtime launched.
    Running,
    /// A stage failed.
    Failed,
}

impl ProvisionState {
    /// Successor on the happy path; `None` for terminals.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::ResolveIdentity => Some(Self::PrepareNamespace),
            Self::PrepareNamespace => Some(Self::FetchTemplate),
            Self::FetchTemplate => Some(Self::Materialize),
            Self::Materialize => Some(Self::WriteConfig),
            Self::WriteConfig => Some(Self::InstallDependencies),
            Self::InstallDependencies => Some(Self::CleanupCredentials),
            Self::CleanupCredentials => Some(Self::StartRuntime),
            Self::StartRuntime => Some(Self::Running),
            Self::Running | Self::Failed => None,
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Running | Self::Failed)
    }

    /// Determine whether a transition is permitted.
    ///
    /// Any non-terminal state may fail; otherwise only the direct successor
    /// is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Failed || self.next() == Some(next)
    }

    /// Stable name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolveIdentity => "resolve_identity",
            Self::PrepareNamespace => "prepare_namespace",
            Self::FetchTemplate => "fetch_template",
            Self::Materialize => "materialize",
            Self::WriteConfig => "write_config",
            Self::InstallDependencies => "install_dependencies",
            Self::CleanupCredentials => "cleanup_credentials",
            Self::StartRuntime => "start_runtime",
            Self::Running => "running",
            Self::Failed => "failed",
        }
    }
}

/// Paths and identity for one provisioning run.
///
/// Built once the identity is known and passed to every later stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionContext {
    /// Resolved identity.
    pub identity: SessionIdentity,
    /// Filesystem-safe form of the session token.
    pub slug: String,
    /// Instance namespace.
    pub instance_dir: PathBuf,
    /// Ephemeral staging checkout.
    pub staging_dir: PathBuf,
    /// Per-session credential file.
    pub credential_file: PathBuf,
    /// Advisory lock file.
    pub lock_file: PathBuf,
}

impl ProvisionContext {
    /// Derive every per-session path from `identity`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Format` if the token leaves an empty slug, since
    /// every such token would share one namespace.
    pub fn new(config: &GlobalConfig, identity: SessionIdentity) -> Result<Self> {
        let token = identity.session_token();
        let slug = namespace::session_slug(token);
        if slug.is_empty() {
            return Err(AppError::Format(
                "session token has no usable characters after the prefix".into(),
            ));
        }

        Ok(Self {
            instance_dir: namespace::resolve_instance_dir(
                &config.instances_root,
                &config.instance_prefix,
                token,
            ),
            staging_dir: namespace::staging_dir(&config.staging_root, token),
            credential_file: namespace::credential_file(&config.credentials_dir, token),
            lock_file: namespace::lock_file(&config.staging_root, token),
            slug,
            identity,
        })
    }
}
