//! Read-only statement validator.
//!
//! `--` line comments are removed first, so a leading comment or a comment
//! mentioning a denied word does not decide the verdict. The statement sent
//! to the warehouse is left as written.
//!
//! A statement is accepted only if all three rules hold, checked in order:
//!
//! 1. **Leading keyword** - the first token (after trimming) is `SELECT`,
//!    `WITH` or `DECLARE`.
//! 2. **Deny-list** - no mutating or execution keyword appears anywhere as a
//!    whole word, in any case. `SET` is on the list and over-blocks benign
//!    uses such as a column alias named `set`; this is accepted.
//! 3. **No chaining** - no semicolon followed by another token. A single
//!    trailing semicolon is fine.
//!
//! The first failing rule decides the reported [`ValidationErrorKind`].
//!
//! [`ValidationErrorKind`]: crate::error::ValidationErrorKind

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Statement types that may start a query.
pub const ALLOWED_LEADING_KEYWORDS: &[&str] = &["SELECT", "WITH", "DECLARE"];

/// Keywords that reject a statement wherever they appear as a whole word.
///
/// `SP_` is matched as a word prefix (system stored procedures such as
/// `sp_executesql`).
pub const DENIED_KEYWORDS: &[&str] = &[
    "MERGE", "CREATE", "SET", "DELETE", "REMOVE", "ADD", "INSERT", "UPDATE", "DROP", "ALTER",
    "TRUNCATE", "GRANT", "REVOKE", "EXEC", "EXECUTE", "SP_",
];

static DENIED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let words: Vec<&str> = DENIED_KEYWORDS
        .iter()
        .copied()
        .filter(|k| !k.ends_with('_'))
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b|\bSP_\w*", words.join("|")))
        .expect("deny-list pattern is a valid regex")
});

static LINE_COMMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--[^\n]*").expect("comment pattern is a valid regex"));

static CHAINING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r";\s*\w").expect("chaining pattern is a valid regex"));

/// Classifies SQL text as safe to execute against the read-only warehouse.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryValidator;

impl QueryValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Validate a statement, returning the first rule it breaks.
    pub fn validate(&self, sql: &str) -> Result<(), ValidationError> {
        let stripped = LINE_COMMENT_PATTERN.replace_all(sql, "");
        let trimmed = stripped.trim();

        let first = first_token(trimmed).to_uppercase();
        if !ALLOWED_LEADING_KEYWORDS.contains(&first.as_str()) {
            tracing::debug!(token = %first, "Rejected statement: leading keyword");
            return Err(ValidationError::disallowed_leading_keyword(&first));
        }

        if let Some(found) = DENIED_PATTERN.find(trimmed) {
            let keyword = found.as_str().to_uppercase();
            tracing::debug!(keyword = %keyword, "Rejected statement: forbidden keyword");
            return Err(ValidationError::forbidden_keyword(&keyword));
        }

        if CHAINING_PATTERN.is_match(trimmed) {
            tracing::debug!("Rejected statement: chained statements");
            return Err(ValidationError::statement_chaining());
        }

        Ok(())
    }

    /// Convenience wrapper returning only the verdict.
    pub fn is_read_only(&self, sql: &str) -> bool {
        self.validate(sql).is_ok()
    }
}

/// Leading run of word characters.
fn first_token(sql: &str) -> &str {
    let end = sql
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(sql.len());
    &sql[..end]
}
