#![forbid(unsafe_code)]

//! `session-provisioner`: provision and launch one session-scoped instance.
//!
//! Loads configuration, resolves the operator identity, materializes the
//! template into the session's namespace, and hands over to the runtime.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use session_provisioner::credentials::prompt::LinePrompter;
use session_provisioner::errors::FAILURE_EXIT_CODE;
use session_provisioner::orchestrator::{Outcome, Provisioner};
use session_provisioner::{AppError, GlobalConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "session-provisioner",
    about = "Provision and launch a session-scoped instance",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the directory instance namespaces are created under.
    #[arg(long)]
    instances_root: Option<PathBuf>,

    /// Override the template source: a git URL or a local directory.
    #[arg(long)]
    template: Option<String>,

    /// Disable ANSI colors in operator prompts.
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let code = match setup(&args) {
        Ok(config) => provision(config, !args.no_color),
        Err(err) => {
            eprintln!("Setup failed: {err}");
            FAILURE_EXIT_CODE
        }
    };

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn setup(args: &Cli) -> Result<GlobalConfig> {
    init_tracing(args.log_format)?;

    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(root) = &args.instances_root {
        config.instances_root.clone_from(root);
    }
    if let Some(template) = &args.template {
        config.override_template(template);
    }

    info!(
        instances_root = %config.instances_root.display(),
        staging_root = %config.staging_root.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn provision(config: GlobalConfig, color: bool) -> i32 {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Setup failed: failed to build tokio runtime: {err}");
            return FAILURE_EXIT_CODE;
        }
    };

    let provisioner = Provisioner::new(config);
    let mut prompter = LinePrompter::stdio(color);
    let report = runtime.block_on(provisioner.run(&mut prompter));

    if let Outcome::Failed { error, .. } = &report.outcome {
        eprintln!("Setup failed: {error}");
    }
    report.exit_code()
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
