//! Pipeline driver.
//!
//! Runs each stage once, in order. The first failure ends the run in
//! [`ProvisionState::Failed`] without rolling back; the next run for the
//! same token starts from a clean namespace anyway.

use tracing::{debug, error, info, warn};

use crate::config::GlobalConfig;
use crate::credentials::prompt::{Prompter, Tone};
use crate::credentials::{resolve_identity, session_file};
use crate::env_file::write_config;
use crate::errors::FAILURE_EXIT_CODE;
use crate::models::instance_config::InstanceConfig;
use crate::namespace::{ensure_clean, remove_path};
use crate::process::{run_inherited, spawn_inherited, wait_for};
use crate::template::{fetch_template, materialize, source_from_config, TemplateSource};
use crate::{AppError, Result};

use super::lock::TokenLock;
use super::{ProvisionContext, ProvisionState, CREDENTIALS_ENV};

/// Terminal result of a run.
#[derive(Debug)]
pub enum Outcome {
    /// The runtime was launched; carries its exit code once it stopped.
    Running {
        /// Exit code of the runtime process.
        runtime_exit: i32,
    },
    /// A stage failed.
    Failed {
        /// Stage that failed.
        state: ProvisionState,
        /// Failure cause.
        error: AppError,
    },
}

/// Everything observable about a finished run.
#[derive(Debug)]
pub struct ProvisionReport {
    /// Terminal outcome.
    pub outcome: Outcome,
    /// States entered, in order, ending with a terminal.
    pub history: Vec<ProvisionState>,
    /// Per-run context, once the identity was resolved.
    pub context: Option<ProvisionContext>,
}

impl ProvisionReport {
    /// Process exit status for this run.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            Outcome::Running { runtime_exit } => *runtime_exit,
            Outcome::Failed { error, .. } => error.exit_code(),
        }
    }

    /// Final state entered.
    #[must_use]
    pub fn final_state(&self) -> ProvisionState {
        self.history
            .last()
            .copied()
            .unwrap_or(ProvisionState::Failed)
    }
}

/// Mutable run state owned by the driver.
struct Run {
    state: ProvisionState,
    history: Vec<ProvisionState>,
    context: Option<ProvisionContext>,
    lock: Option<TokenLock>,
}

impl Run {
    fn new() -> Self {
        Self {
            state: ProvisionState::ResolveIdentity,
            history: vec![ProvisionState::ResolveIdentity],
            context: None,
            lock: None,
        }
    }

    fn advance(&mut self, next: ProvisionState) {
        debug_assert!(self.state.can_transition_to(next));
        info!(from = self.state.as_str(), to = next.as_str(), "state transition");
        self.state = next;
        self.history.push(next);
    }

    fn release_lock(&mut self) {
        if let Some(lock) = self.lock.take() {
            debug!(path = %lock.path().display(), "lock released");
        }
    }

    fn context(&self) -> Result<&ProvisionContext> {
        self.context
            .as_ref()
            .ok_or_else(|| AppError::Config("pipeline context missing".into()))
    }
}

/// Drives one provisioning run.
pub struct Provisioner {
    config: GlobalConfig,
    source: Box<dyn TemplateSource>,
}

impl Provisioner {
    /// Provisioner using the template source named in `config`.
    #[must_use]
    pub fn new(config: GlobalConfig) -> Self {
        let source = source_from_config(&config.template);
        Self { config, source }
    }

    /// Provisioner with an explicit template source.
    #[must_use]
    pub fn with_source(config: GlobalConfig, source: Box<dyn TemplateSource>) -> Self {
        Self { config, source }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Run the whole pipeline, blocking until the runtime exits.
    ///
    /// On failure the operator channel is closed and the cause is logged;
    /// the caller decides how to report it and which status to exit with.
    pub async fn run(&self, prompter: &mut dyn Prompter) -> ProvisionReport {
        let mut run = Run::new();

        match self.drive(&mut run, prompter).await {
            Ok(runtime_exit) => ProvisionReport {
                outcome: Outcome::Running { runtime_exit },
                history: run.history,
                context: run.context,
            },
            Err(error) => {
                let state = run.state;
                prompter.close();
                run.release_lock();
                error!(state = state.as_str(), %error, "provisioning failed");
                run.advance(ProvisionState::Failed);
                ProvisionReport {
                    outcome: Outcome::Failed { state, error },
                    history: run.history,
                    context: run.context,
                }
            }
        }
    }

    async fn drive(&self, run: &mut Run, prompter: &mut dyn Prompter) -> Result<i32> {
        self.resolve(run, prompter)?;

        run.advance(ProvisionState::PrepareNamespace);
        self.prepare_namespace(run)?;

        run.advance(ProvisionState::FetchTemplate);
        prompter.say(Tone::Plain, "Cloning repository...")?;
        fetch_template(&*self.source, &run.context()?.staging_dir).await?;

        run.advance(ProvisionState::Materialize);
        let ctx = run.context()?;
        materialize(&ctx.staging_dir, &ctx.instance_dir)?;

        run.advance(ProvisionState::WriteConfig);
        let ctx = run.context()?;
        let instance_config = InstanceConfig::for_identity(&ctx.identity, &self.config.instance);
        write_config(&ctx.instance_dir, &instance_config)?;

        run.advance(ProvisionState::InstallDependencies);
        prompter.say(Tone::Plain, "Installing dependencies...")?;
        let ctx = run.context()?;
        let credentials = ctx.credential_file.to_string_lossy().into_owned();
        run_inherited(
            &self.config.install,
            &ctx.instance_dir,
            &[(CREDENTIALS_ENV, credentials.as_str())],
        )
        .await?;

        run.advance(ProvisionState::CleanupCredentials);
        self.cleanup_credentials(run.context()?)?;

        run.advance(ProvisionState::StartRuntime);
        run.release_lock();
        prompter.say(Tone::Plain, "Starting bot...")?;
        let instance_dir = run.context()?.instance_dir.clone();
        let mut child = spawn_inherited(&self.config.start, &instance_dir, &[])?;

        run.advance(ProvisionState::Running);
        info!(instance = %instance_dir.display(), "instance running");

        let runtime_exit = match wait_for(&mut child, &self.config.start).await {
            Ok(code) => code.unwrap_or(FAILURE_EXIT_CODE),
            Err(err) => {
                warn!(%err, "lost track of runtime process");
                FAILURE_EXIT_CODE
            }
        };
        Ok(runtime_exit)
    }

    fn resolve(&self, run: &mut Run, prompter: &mut dyn Prompter) -> Result<()> {
        let resolved = resolve_identity(&self.config.preloaded_credentials, prompter)?;
        let ctx = ProvisionContext::new(&self.config, resolved.identity)?;
        info!(slug = %ctx.slug, instance = %ctx.instance_dir.display(), "context resolved");
        run.context = Some(ctx);
        Ok(())
    }

    fn prepare_namespace(&self, run: &mut Run) -> Result<()> {
        if self.config.exclusive_lock {
            let lock = TokenLock::acquire(&run.context()?.lock_file)?;
            run.lock = Some(lock);
        }
        let ctx = run.context()?;
        session_file::write(&ctx.credential_file, &ctx.identity)?;
        ensure_clean(&ctx.instance_dir)
    }

    fn cleanup_credentials(&self, ctx: &ProvisionContext) -> Result<()> {
        remove_path(&ctx.credential_file)?;
        remove_path(&self.config.preloaded_credentials)?;
        info!(slug = %ctx.slug, "credential files removed");
        Ok(())
    }
}
