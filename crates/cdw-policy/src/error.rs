//! Validation error types for statement and identifier policy.

use std::fmt;

/// Error type for validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The kind of validation error.
    pub kind: ValidationErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    // =========================================================================
    // STATEMENT POLICY ERRORS
    // =========================================================================

    /// The statement does not start with an allowed keyword.
    pub fn disallowed_leading_keyword(found: &str) -> Self {
        let found = if found.is_empty() {
            "<empty statement>".to_string()
        } else {
            format!("'{}'", found)
        };
        Self::new(
            ValidationErrorKind::DisallowedLeadingKeyword,
            format!(
                "Only SELECT, WITH, and DECLARE statements are allowed; statement starts with {}",
                found
            ),
        )
    }

    /// The statement contains a mutating or execution keyword.
    pub fn forbidden_keyword(keyword: &str) -> Self {
        Self::new(
            ValidationErrorKind::ForbiddenKeyword,
            format!(
                "Write operations are blocked: statement contains forbidden keyword '{}'",
                keyword
            ),
        )
    }

    /// The statement chains a second statement after a semicolon.
    pub fn statement_chaining() -> Self {
        Self::new(
            ValidationErrorKind::StatementChaining,
            "Multiple statements are not allowed: found a semicolon followed by another statement",
        )
    }

    // =========================================================================
    // INTERPOLATION ERRORS
    // =========================================================================

    /// An identifier failed the allow-list pattern.
    pub fn unsafe_identifier(identifier: &str) -> Self {
        Self::new(
            ValidationErrorKind::UnsafeIdentifier,
            format!(
                "Invalid identifier '{}': only letters, digits, underscores and dots are allowed",
                identifier
            ),
        )
    }

    /// A key value failed the allow-list pattern.
    pub fn unsafe_value(field: &str, value: &str) -> Self {
        Self::new(
            ValidationErrorKind::UnsafeValue,
            format!(
                "Invalid value for '{}': '{}' (expected 1-64 letters, digits, '-' or '_')",
                field, value
            ),
        )
    }

    /// Short machine-friendly reason class.
    pub fn reason_class(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// First token is not SELECT, WITH or DECLARE.
    DisallowedLeadingKeyword,
    /// A deny-listed keyword appears as a whole word.
    ForbiddenKeyword,
    /// A second statement follows a semicolon.
    StatementChaining,
    /// An interpolated identifier failed the identifier pattern.
    UnsafeIdentifier,
    /// An interpolated key value failed the key-value pattern.
    UnsafeValue,
}

impl ValidationErrorKind {
    /// Stable snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::DisallowedLeadingKeyword => "disallowed_leading_keyword",
            ValidationErrorKind::ForbiddenKeyword => "forbidden_keyword",
            ValidationErrorKind::StatementChaining => "statement_chaining",
            ValidationErrorKind::UnsafeIdentifier => "unsafe_identifier",
            ValidationErrorKind::UnsafeValue => "unsafe_value",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
