//! Read-only policy enforcement for warehouse statements.
//!
//! Two independent perimeters live here:
//!
//! 1. [`QueryValidator`] classifies a complete SQL statement as read-only or
//!    rejects it with a reason class. It is the fail-fast layer in front of
//!    the warehouse; database-level read-only grants remain the real
//!    boundary.
//! 2. [`identifier`] holds the narrower rules for values that are
//!    interpolated into generated SQL: table/column identifiers, key values
//!    and quoted literals.

pub mod error;
pub mod identifier;
pub mod validator;

pub use error::{ValidationError, ValidationErrorKind};
pub use identifier::{quote_identifier, quote_literal, validate_identifier, validate_key_value};
pub use validator::{ALLOWED_LEADING_KEYWORDS, DENIED_KEYWORDS, QueryValidator};
