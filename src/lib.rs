#![forbid(unsafe_code)]

//! Session-scoped instance provisioning.
//!
//! Resolves an operator identity, prepares a per-session namespace,
//! materializes a template into it, writes `config.env`, installs
//! dependencies, and launches the runtime.

pub mod config;
pub mod credentials;
pub mod env_file;
pub mod errors;
pub mod models;
pub mod namespace;
pub mod orchestrator;
pub mod process;
pub mod template;
pub mod validate;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
