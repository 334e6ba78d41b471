//! Syntactic validation of operator-supplied identity.
//!
//! Both checks are pure and total: they never panic and never touch the
//! filesystem. Rejections are `AppError::Format` so the interactive path can
//! surface the message and re-prompt.

use crate::{AppError, Result};

/// Literal prefix every session token must start with.
pub const SESSION_PREFIX: &str = "kord_ai-";

/// Usage example shown after a rejected session token.
pub const SESSION_EXAMPLE: &str = "kord_ai-abc123xyz";

/// Usage example shown after a rejected owner number.
pub const OWNER_EXAMPLE: &str = "234XXXXXXXXXX";

/// Inclusive bounds on the number of digits in an owner number.
pub const OWNER_DIGITS_MIN: usize = 10;
/// Upper bound, inclusive.
pub const OWNER_DIGITS_MAX: usize = 15;

/// Validate a raw session token, returning the trimmed value.
///
/// # Errors
///
/// Returns `AppError::Format` if the trimmed input does not start with
/// [`SESSION_PREFIX`].
pub fn validate_session_token(raw: &str) -> Result<String> {
    let token = raw.trim();
    if token.starts_with(SESSION_PREFIX) {
        Ok(token.to_owned())
    } else {
        Err(AppError::Format(format!(
            "must start with \"{SESSION_PREFIX}\""
        )))
    }
}

/// Validate a raw owner number, returning the normalized digit string.
///
/// Whitespace and `-` separators are removed anywhere in the input, then any
/// leading `+` is dropped. What remains must be 10–15 ASCII digits.
///
/// # Errors
///
/// Returns `AppError::Format` if a non-digit remains or the digit count is
/// out of range.
pub fn validate_owner_number(raw: &str) -> Result<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let number = compact.trim_start_matches('+');

    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Format("only digits allowed".into()));
    }

    if !(OWNER_DIGITS_MIN..=OWNER_DIGITS_MAX).contains(&number.len()) {
        return Err(AppError::Format(format!(
            "must be {OWNER_DIGITS_MIN}-{OWNER_DIGITS_MAX} digits"
        )));
    }

    Ok(number.to_owned())
}

