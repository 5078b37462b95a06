//! # cdw-schema
//!
//! Tiered access to the warehouse data dictionary.
//!
//! The dictionary describes 100+ tables and thousands of columns, far too
//! much to hand to an assistant in one response. It is served in three
//! shapes instead:
//!
//! | Shape | Call | Size |
//! |-------|------|------|
//! | Overview | [`SchemaIndex::overview`] | one line per table, no columns |
//! | Detail | [`SchemaIndex::describe`] | one table, every column |
//! | Search | [`SchemaIndex::search`] | tables/columns matching a keyword |
//!
//! None of these touch the database. The index is parsed once from the
//! bundled reference document and cached by [`SchemaCatalog`].

pub mod dictionary;
pub mod error;
pub mod index;
pub mod loader;
pub mod model;
pub mod notes;

pub use dictionary::{ColumnRecord, TableRecord, merge_records, read_dictionary};
pub use loader::{SchemaCatalog, SchemaDocument};
pub use error::SchemaError;
pub use index::{ColumnMatch, SchemaIndex, SearchHit, SearchOutcome, TableSummary};
pub use model::{ColumnDescriptor, LookupRelation, TableDescriptor};
