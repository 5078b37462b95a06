//! Rules for values interpolated into generated SQL.
//!
//! These are deliberately separate from the statement validator: a table
//! name spliced into `SELECT COUNT(*) FROM <name>` never passes through the
//! deny-list, so it has to satisfy a strict allow-list instead.

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*$").expect("identifier pattern is a valid regex")
});

static KEY_VALUE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("key pattern is a valid regex"));

/// Check a (possibly schema-qualified) identifier against the allow-list.
///
/// Letters, digits and underscores, with dots separating non-empty parts.
pub fn validate_identifier(identifier: &str) -> Result<&str, ValidationError> {
    if IDENTIFIER_PATTERN.is_match(identifier) {
        Ok(identifier)
    } else {
        Err(ValidationError::unsafe_identifier(identifier))
    }
}

/// Validate and double-quote an identifier, part by part.
///
/// `deid_uf.PatientDim` becomes `"deid_uf"."PatientDim"`, which preserves the
/// warehouse's mixed-case names.
pub fn quote_identifier(identifier: &str) -> Result<String, ValidationError> {
    let identifier = validate_identifier(identifier)?;
    Ok(identifier
        .split('.')
        .map(|part| format!("\"{}\"", part))
        .collect::<Vec<_>>()
        .join("."))
}

/// Check a key value (patient durable key, note key) before interpolation.
pub fn validate_key_value<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if KEY_VALUE_PATTERN.is_match(value) {
        Ok(value)
    } else {
        Err(ValidationError::unsafe_value(field, value))
    }
}

/// Render free text as a single-quoted SQL literal.
pub fn quote_literal(value: &str) -> String {
    let escaped: String = value.replace('\0', "").replace('\'', "''");
    format!("'{}'", escaped)
}
