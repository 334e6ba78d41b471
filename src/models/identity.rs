//! Session identity resolved once per provisioning run.

use serde::{Deserialize, Serialize};

use crate::validate::{validate_owner_number, validate_session_token};
use crate::Result;

/// Operator-supplied identity that an instance is bound to.
///
/// Immutable after construction; fields are exposed through accessors only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Session token, e.g. `kord_ai-abc123xyz`.
    #[serde(rename = "session")]
    session_token: String,
    /// Normalized owner contact number (digits only).
    #[serde(rename = "owner")]
    owner_number: String,
}

impl SessionIdentity {
    /// Build an identity from raw operator input, running both validators.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Format` if either value is malformed.
    pub fn validated(session_token: &str, owner_number: &str) -> Result<Self> {
        Ok(Self {
            session_token: validate_session_token(session_token)?,
            owner_number: validate_owner_number(owner_number)?,
        })
    }

    /// Build an identity from values a trusted producer already resolved.
    ///
    /// No validation is performed; the preloaded credential record is
    /// accepted as-is.
    #[must_use]
    pub fn trusted(session_token: String, owner_number: String) -> Self {
        Self {
            session_token,
            owner_number,
        }
    }

    /// Session token as supplied.
    #[must_use]
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// Normalized owner number.
    #[must_use]
    pub fn owner_number(&self) -> &str {
        &self.owner_number
    }
}
