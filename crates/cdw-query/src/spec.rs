//! Query specifications handed to the execution gateway.

use serde::Serialize;
use std::fmt;

/// SQL text plus the row bound it must be executed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// The statement. Free-form specs carry the caller's text unchanged.
    pub sql: String,

    /// Maximum rows to retrieve.
    pub row_limit: u64,

    /// The canned intent this statement was built for, if any.
    pub intent: Option<CannedIntent>,
}

impl QuerySpec {
    /// Wrap caller-supplied SQL. The text is not rewritten.
    pub fn free_form(sql: impl Into<String>, row_limit: u64) -> Self {
        Self {
            sql: sql.into(),
            row_limit,
            intent: None,
        }
    }

    pub(crate) fn canned(sql: String, row_limit: u64, intent: CannedIntent) -> Self {
        Self {
            sql,
            row_limit,
            intent: Some(intent),
        }
    }

    /// True for statements built by the constructor.
    pub fn is_canned(&self) -> bool {
        self.intent.is_some()
    }
}

/// What a canned statement was built for, and for which identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CannedIntent {
    pub kind: IntentKind,
    pub identifier: String,
}

impl CannedIntent {
    pub fn new(kind: IntentKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for CannedIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.identifier)
    }
}

/// Kinds of canned statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Demographics,
    Encounters,
    Medications,
    Diagnoses,
    Labs,
    NoteSearch,
    Note,
    ConceptMap,
    ConceptSearch,
    TableSummary,
    CohortSummary,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Demographics => "demographics",
            IntentKind::Encounters => "encounters",
            IntentKind::Medications => "medications",
            IntentKind::Diagnoses => "diagnoses",
            IntentKind::Labs => "labs",
            IntentKind::NoteSearch => "note_search",
            IntentKind::Note => "note",
            IntentKind::ConceptMap => "concept_map",
            IntentKind::ConceptSearch => "concept_search",
            IntentKind::TableSummary => "table_summary",
            IntentKind::CohortSummary => "cohort_summary",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
