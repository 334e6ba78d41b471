//! Template fetching and materialization.
//!
//! A [`TemplateSource`] fills a session-scoped staging directory; the
//! staging contents are then copied into the instance namespace and the
//! staging directory is discarded, whatever the outcome of the copy.

pub mod copy;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{info, warn};

use crate::config::{CommandConfig, TemplateConfig};
use crate::namespace::remove_path;
use crate::process::run_inherited;
use crate::{AppError, Result};

pub use copy::MaterializeSummary;

/// Origin of template contents.
pub trait TemplateSource: Send + Sync {
    /// Populate `staging` with the template.
    ///
    /// `staging` does not exist when this is called; its parent does.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Fetch`] if the template cannot be retrieved.
    fn fetch<'a>(&'a self, staging: &'a Path)
        -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Clone a git repository with the `git` binary.
#[derive(Debug, Clone)]
pub struct GitSource {
    /// Repository URL.
    pub url: String,
    /// Optional branch or tag.
    pub branch: Option<String>,
}

impl TemplateSource for GitSource {
    fn fetch<'a>(
        &'a self,
        staging: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut args = vec!["clone".to_owned()];
            if let Some(branch) = &self.branch {
                args.push("--branch".into());
                args.push(branch.clone());
            }
            // Clone by directory name from inside the parent so a non-UTF-8
            // staging root reaches git unchanged through the working directory.
            let target = staging
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    AppError::Fetch(format!(
                        "staging directory name is not valid UTF-8: {}",
                        staging.display()
                    ))
                })?;
            args.push(self.url.clone());
            args.push(target.to_owned());

            let command = CommandConfig {
                program: "git".into(),
                args,
            };
            let cwd = staging.parent().unwrap_or_else(|| Path::new("."));

            run_inherited(&command, cwd, &[]).await.map_err(|err| {
                AppError::Fetch(format!("failed to clone {}: {err}", self.url))
            })
        })
    }

    fn describe(&self) -> String {
        match &self.branch {
            Some(branch) => format!("git {} ({branch})", self.url),
            None => format!("git {}", self.url),
        }
    }
}

/// Copy a template directory that is already on disk.
#[derive(Debug, Clone)]
pub struct LocalSource {
    /// Directory holding the template.
    pub path: PathBuf,
}

impl TemplateSource for LocalSource {
    fn fetch<'a>(
        &'a self,
        staging: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if !self.path.is_dir() {
                return Err(AppError::Fetch(format!(
                    "template directory {} does not exist",
                    self.path.display()
                )));
            }
            copy::copy_tree(&self.path, staging)
                .map(|_| ())
                .map_err(|err| AppError::Fetch(format!("failed to copy local template: {err}")))
        })
    }

    fn describe(&self) -> String {
        format!("local {}", self.path.display())
    }
}

/// Build the configured template source.
#[must_use]
pub fn source_from_config(config: &TemplateConfig) -> Box<dyn TemplateSource> {
    match config {
        TemplateConfig::Git { url, branch } => Box::new(GitSource {
            url: url.clone(),
            branch: branch.clone(),
        }),
        TemplateConfig::Local { path } => Box::new(LocalSource { path: path.clone() }),
    }
}

/// Fetch the template into a fresh staging directory.
///
/// A staging directory left behind by an interrupted run for the same
/// token is destroyed first.
///
/// # Errors
///
/// Returns `AppError::Fetch` if the staging directory cannot be reset or the
/// source fails.
pub async fn fetch_template(source: &dyn TemplateSource, staging: &Path) -> Result<()> {
    remove_path(staging)
        .map_err(|err| AppError::Fetch(format!("stale staging directory: {err}")))?;

    if let Some(parent) = staging.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            AppError::Fetch(format!(
                "failed to create staging root {}: {err}",
                parent.display()
            ))
        })?;
    }

    info!(source = %source.describe(), staging = %staging.display(), "fetching template");
    source.fetch(staging).await
}

/// Copy staging contents into the instance directory, then drop staging.
///
/// The staging directory is removed whether or not the copy succeeded;
/// a removal failure is logged and never replaces a copy error.
///
/// # Errors
///
/// Returns `AppError::Filesystem` if any entry fails to copy.
pub fn materialize(staging: &Path, instance_dir: &Path) -> Result<MaterializeSummary> {
    let outcome = copy::copy_tree(staging, instance_dir);

    if let Err(err) = remove_path(staging) {
        warn!(staging = %staging.display(), %err, "failed to remove staging directory");
    }

    let summary = outcome?;
    info!(
        files = summary.files,
        directories = summary.directories,
        symlinks = summary.symlinks,
        instance = %instance_dir.display(),
        "template materialized"
    );
    Ok(summary)
}
