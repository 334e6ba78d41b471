//! Session identity resolution.
//!
//! Two mutually exclusive paths: a preloaded record staged by an external
//! producer, or interactive prompting with validation. The operator
//! channel is closed once an identity is resolved, whichever path ran.

pub mod preloaded;
pub mod prompt;
pub mod session_file;

use std::path::Path;

use tracing::info;

use crate::models::identity::SessionIdentity;
use crate::validate::{
    validate_owner_number, validate_session_token, OWNER_EXAMPLE, SESSION_EXAMPLE,
};
use crate::{AppError, Result};

use prompt::{Prompter, Tone};

/// Label shown when asking for the session token.
pub const SESSION_LABEL: &str = "SESSION_ID: ";
/// Label shown when asking for the owner number.
pub const OWNER_LABEL: &str = "OWNER_NUMBER: ";

/// How the identity was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOrigin {
    /// Consumed from the preloaded credential record.
    Preloaded,
    /// Entered by the operator.
    Interactive,
}

/// Resolved identity plus its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// The identity itself.
    pub identity: SessionIdentity,
    /// Which path produced it.
    pub origin: IdentityOrigin,
}

/// Resolve the session identity, closing `prompter` afterwards.
///
/// # Errors
///
/// Returns `AppError::Io` if the operator channel fails or input ends
/// before valid values are entered. Format errors never escape; they are
/// reported and the question is asked again.
pub fn resolve_identity(
    preloaded_path: &Path,
    prompter: &mut dyn Prompter,
) -> Result<ResolvedIdentity> {
    let resolved = match preloaded::consume(preloaded_path) {
        Some(identity) => Ok(ResolvedIdentity {
            identity,
            origin: IdentityOrigin::Preloaded,
        }),
        None => prompt_identity(prompter).map(|identity| ResolvedIdentity {
            identity,
            origin: IdentityOrigin::Interactive,
        }),
    };
    prompter.close();

    if let Ok(resolved) = &resolved {
        info!(origin = ?resolved.origin, "session identity resolved");
    }
    resolved
}

/// Prompt for both values until each passes validation.
///
/// # Errors
///
/// Returns `AppError::Io` if the operator channel fails.
pub fn prompt_identity(prompter: &mut dyn Prompter) -> Result<SessionIdentity> {
    prompter.say(Tone::Heading, "Enter your session ID to continue\n")?;
    let session = ask_until_valid(
        prompter,
        SESSION_LABEL,
        validate_session_token,
        SESSION_EXAMPLE,
        "Session ID accepted\n",
    )?;

    prompter.say(Tone::Heading, "Enter your OWNER NUMBER to continue\n")?;
    let owner = ask_until_valid(
        prompter,
        OWNER_LABEL,
        validate_owner_number,
        OWNER_EXAMPLE,
        "Owner number accepted\n",
    )?;

    Ok(SessionIdentity::trusted(session, owner))
}

fn ask_until_valid(
    prompter: &mut dyn Prompter,
    label: &str,
    validate: fn(&str) -> Result<String>,
    example: &str,
    accepted: &str,
) -> Result<String> {
    loop {
        let raw = prompter.ask(label)?;
        match validate(&raw) {
            Ok(value) => {
                prompter.say(Tone::Success, accepted)?;
                return Ok(value);
            }
            Err(AppError::Format(reason)) => {
                prompter.say(Tone::Error, &format!("Error: {reason}"))?;
                prompter.say(Tone::Hint, &format!("Example: {example}"))?;
            }
            Err(other) => return Err(other),
        }
    }
}
