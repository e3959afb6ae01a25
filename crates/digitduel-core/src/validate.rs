//! Guess validation.
//!
//! Pure function, no I/O. A failed validation never reaches the session
//! service; the error is surfaced inline by the presentation layer.

use thiserror::Error;

/// Why a candidate guess was rejected locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Input was empty after trimming.
    #[error("please enter a guess")]
    Empty,

    /// Input length did not match the level's digit count.
    #[error("guess must be exactly {expected} digits")]
    WrongLength {
        /// Digit count required by the session's level.
        expected: usize,
    },

    /// Input contained a non-decimal-digit character.
    #[error("guess must contain only digits")]
    NotNumeric,
}

/// Validate a candidate guess against the level's digit count.
///
/// Rules are checked in order and the first failure wins: non-empty after
/// trimming, exact length, decimal digits only. Returns the trimmed input
/// on success.
pub fn validate(input: &str, expected_digits: usize) -> Result<&str, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if trimmed.chars().count() != expected_digits {
        return Err(ValidationError::WrongLength { expected: expected_digits });
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::NotNumeric);
    }
    Ok(trimmed)
}
