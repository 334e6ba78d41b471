//! Global configuration parsing and validation.
//!
//! Every field has a default, so running without a config file reproduces
//! the stock launcher: clone the public template, `npm install`, `npm start`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::models::instance_config::InstanceDefaults;
use crate::{AppError, Result};

/// Default git URL of the template application.
pub const DEFAULT_TEMPLATE_URL: &str = "https://github.com/M3264/Kord-Ai";

/// Where the template is fetched from.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateConfig {
    /// Clone a git repository.
    Git {
        /// Repository URL.
        url: String,
        /// Optional branch or tag to check out.
        #[serde(default)]
        branch: Option<String>,
    },
    /// Copy a directory already present on disk.
    Local {
        /// Directory holding the template.
        path: PathBuf,
    },
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self::Git {
            url: DEFAULT_TEMPLATE_URL.into(),
            branch: None,
        }
    }
}

/// External command run inside the instance directory.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CommandConfig {
    /// Program to execute, resolved through `PATH`.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandConfig {
    /// Convenience constructor.
    #[must_use]
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        }
    }

    /// Printable command line used in logs and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn default_install() -> CommandConfig {
    CommandConfig::new("npm", &["install"])
}

fn default_start() -> CommandConfig {
    CommandConfig::new("npm", &["start"])
}

fn default_instances_root() -> PathBuf {
    PathBuf::from("instances")
}

fn default_instance_prefix() -> String {
    "instance-".into()
}

fn default_staging_root() -> PathBuf {
    std::env::temp_dir().join("session-provisioner")
}

fn default_credentials_dir() -> PathBuf {
    PathBuf::from("credentials")
}

fn default_preloaded_credentials() -> PathBuf {
    default_credentials_dir().join("preloaded.json")
}

fn default_true() -> bool {
    true
}

/// Global configuration parsed from `provisioner.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory under which instance namespaces are created.
    #[serde(default = "default_instances_root")]
    pub instances_root: PathBuf,
    /// Fixed name prefix of each instance directory.
    #[serde(default = "default_instance_prefix")]
    pub instance_prefix: String,
    /// Directory holding staging checkouts and per-token lock files.
    #[serde(default = "default_staging_root")]
    pub staging_root: PathBuf,
    /// Directory holding per-session credential files.
    #[serde(default = "default_credentials_dir")]
    pub credentials_dir: PathBuf,
    /// Well-known location of an externally staged credential record.
    #[serde(default = "default_preloaded_credentials")]
    pub preloaded_credentials: PathBuf,
    /// Refuse to run while another live run holds the same token.
    #[serde(default = "default_true")]
    pub exclusive_lock: bool,
    /// Template source.
    #[serde(default)]
    pub template: TemplateConfig,
    /// Dependency install command.
    #[serde(default = "default_install")]
    pub install: CommandConfig,
    /// Runtime start command.
    #[serde(default = "default_start")]
    pub start: CommandConfig,
    /// Fixed values written alongside the identity into `config.env`.
    #[serde(default)]
    pub instance: InstanceDefaults,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            instances_root: default_instances_root(),
            instance_prefix: default_instance_prefix(),
            staging_root: default_staging_root(),
            credentials_dir: default_credentials_dir(),
            preloaded_credentials: default_preloaded_credentials(),
            exclusive_lock: true,
            template: TemplateConfig::default(),
            install: default_install(),
            start: default_start(),
            instance: InstanceDefaults::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the template source from a CLI value.
    ///
    /// An existing directory becomes a local source; anything else is
    /// treated as a git URL.
    pub fn override_template(&mut self, value: &str) {
        let candidate = Path::new(value);
        self.template = if candidate.is_dir() {
            TemplateConfig::Local {
                path: candidate.to_path_buf(),
            }
        } else {
            TemplateConfig::Git {
                url: value.to_owned(),
                branch: None,
            }
        };
    }

    fn validate(&self) -> Result<()> {
        if self.instance_prefix.is_empty() {
            return Err(AppError::Config("instance_prefix must not be empty".into()));
        }

        for (name, command) in [("install", &self.install), ("start", &self.start)] {
            if command.program.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "{name}.program must not be empty"
                )));
            }
        }

        match &self.template {
            TemplateConfig::Git { url, .. } if url.trim().is_empty() => {
                Err(AppError::Config("template.url must not be empty".into()))
            }
            _ => Ok(()),
        }
    }
}
