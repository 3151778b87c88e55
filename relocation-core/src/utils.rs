//! Parsing and formatting helpers shared by the form engines.

use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when form text cannot be read as a number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseNumberError {
    #[error("value is empty")]
    Empty,

    #[error("invalid number '{0}'")]
    Invalid(String),
}

/// Normalizes money input: trims whitespace and removes commas (thousands separator).
pub(crate) fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a plain decimal: trimmed, no thousands separators. Used for
/// counts, ages and coordinates, where `"1,5"` is not a number.
pub fn parse_plain_decimal(s: &str) -> Result<Decimal, ParseNumberError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseNumberError::Empty);
    }
    trimmed
        .parse()
        .map_err(|_| ParseNumberError::Invalid(s.to_string()))
}

/// Parses a required [`Decimal`] from form text.
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`).
/// Empty or whitespace-only input is an error, unlike the optional variant.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseNumberError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Err(ParseNumberError::Empty);
    }
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid decimal: {}", e);
        ParseNumberError::Invalid(s.to_string())
    })
}

/// Parses a string into an optional [`Decimal`].
///
/// Returns `None` for empty or whitespace-only input,
/// or when parsing fails (logs a warning on parse failure).
pub fn parse_optional_decimal(s: &str) -> Option<Decimal> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        None
    } else {
        normalized.parse().map_or_else(
            |e| {
                tracing::warn!(input = %s, "invalid optional decimal: {}", e);
                None
            },
            Some,
        )
    }
}

/// Parses a whole number from form text. `"3"` and `" 3 "` are accepted,
/// `"3.5"`, `"1,5"` and `""` are not.
pub fn parse_integer(s: &str) -> Result<i64, ParseNumberError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseNumberError::Empty);
    }
    trimmed
        .parse()
        .map_err(|_| ParseNumberError::Invalid(s.to_string()))
}

/// Turns a column key into a display label (`current_grade` → `current grade`).
pub fn format_label(key: &str) -> String {
    key.replace('_', " ")
}
