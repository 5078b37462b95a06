//! # cdw-query
//!
//! Builds SQL for canned clinical intents.
//!
//! The warehouse keeps patients in a slowly-changing dimension: `PatientDim`
//! has one row per version of a patient, each with its own `PatientKey`,
//! while `PatientDurableKey` is shared by every version. Most historical
//! fact rows were stamped with a `PatientKey` that has since been
//! superseded, so every per-patient query built here filters on
//! `PatientDurableKey`. The patient dimension is never joined to a fact
//! table; where a fact table lacks the durable key, an `EXISTS` filter is
//! used instead.
//!
//! The constructor only produces [`QuerySpec`] values. Execution, and the
//! read-only validation every statement passes through first, live in
//! `cdw-adapter-pg`.

pub mod concepts;
pub mod constructor;
pub mod date_key;
pub mod error;
pub mod intent;
pub mod spec;
pub mod summary;

pub use concepts::{ConceptDomain, VocabularyScope};
pub use constructor::{NOTE_SNIPPET_LENGTH, QueryConstructor, SEARCH_ROW_LIMIT};
pub use date_key::{DateRange, date_key, is_sentinel};
pub use error::QueryError;
pub use intent::{IntentDefinition, PatientEntity, PatientLink};
pub use spec::{CannedIntent, IntentKind, QuerySpec};
pub use summary::{MAX_SUMMARY_COLUMNS, SummaryColumn, TableSummarySpec, null_percentage};
