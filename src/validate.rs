//! Pure input validators for submitted link rows.
//!
//! These are referentially transparent and safe to call any number of
//! times; all state lives with the callers.

use thiserror::Error;
use url::Url;

pub const MAX_SHORTCODE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL must be absolute with scheme http or https")]
    InvalidUrl,
    #[error("shortcode must be 1-16 alphanumeric characters")]
    InvalidShortcode,
    #[error("validity must be a positive integer of minutes")]
    InvalidValidity,
}

/// Accepts only absolute URLs with scheme exactly `http` or `https`.
pub fn validate_url(s: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(s).map_err(|_| ValidationError::InvalidUrl)?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::InvalidUrl),
    }
}

/// Accepts `[A-Za-z0-9]{1,16}`.
pub fn validate_shortcode(s: &str) -> Result<(), ValidationError> {
    let valid = !s.is_empty()
        && s.len() <= MAX_SHORTCODE_LEN
        && s.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidShortcode)
    }
}

/// Parses a validity period in whole minutes. Zero, negative, fractional,
/// and non-numeric inputs all fail. Blank input is not handled here: the
/// caller substitutes its default before validating.
pub fn validate_validity_period(s: &str) -> Result<i64, ValidationError> {
    match s.trim().parse::<i64>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(ValidationError::InvalidValidity),
    }
}
