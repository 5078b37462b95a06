//! Loading the schema reference document.
//!
//! The document is a JSON object keyed by table name:
//!
//! ```json
//! {
//!   "PatientDim": {
//!     "description": "...",
//!     "has_patient_data": true,
//!     "patient_key_column": "PatientDurableKey",
//!     "columns": [{ "name": "PatientKey", "data_type": "bigint", "ordinal_position": 1 }]
//!   }
//! }
//! ```

use crate::error::SchemaError;
use crate::index::SchemaIndex;
use crate::model::{ColumnDescriptor, LookupRelation, TableDescriptor};
use crate::notes::builtin_note;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk form of the schema reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument {
    pub tables: BTreeMap<String, TableEntry>,
}

/// One table in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub has_patient_data: bool,
    #[serde(default)]
    pub has_phi: bool,
    #[serde(default)]
    pub has_encounter_data: bool,
    #[serde(default)]
    pub patient_key_column: Option<String>,
    #[serde(default)]
    pub encounter_key_column: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_notes: Option<String>,
}

/// One column in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEntry {
    #[serde(alias = "column_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_ordinal")]
    pub ordinal_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_type: Option<String>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub queryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Spreadsheet exports write ordinals as `3`, `3.0` or `"3"`.
fn lenient_ordinal<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().and_then(ordinal_from_f64),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().and_then(ordinal_from_f64),
        _ => None,
    })
}

pub(crate) fn ordinal_from_f64(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

impl SchemaDocument {
    /// Parse a document from JSON text.
    pub fn from_json(content: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read and parse a document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the in-memory index, attaching built-in notes where the
    /// document has none.
    pub fn into_index(self) -> SchemaIndex {
        SchemaIndex::from_tables(
            self.tables
                .into_iter()
                .map(|(name, entry)| entry.into_descriptor(name)),
        )
    }

    /// Inverse of [`SchemaDocument::into_index`], minus built-in notes.
    pub fn from_index(index: &SchemaIndex) -> Self {
        let tables = index
            .tables()
            .map(|t| (t.name.clone(), TableEntry::from_descriptor(t)))
            .collect();
        Self { tables }
    }
}

impl TableEntry {
    fn into_descriptor(self, name: String) -> TableDescriptor {
        let data_notes = self
            .data_notes
            .filter(|n| !n.trim().is_empty())
            .or_else(|| builtin_note(&name).map(str::to_string));
        TableDescriptor {
            description: self.description.unwrap_or_default(),
            has_patient_data: self.has_patient_data,
            has_phi: self.has_phi,
            has_encounter_data: self.has_encounter_data,
            patient_key_column: self.patient_key_column.filter(|c| !c.is_empty()),
            encounter_key_column: self.encounter_key_column.filter(|c| !c.is_empty()),
            columns: self.columns.into_iter().map(ColumnEntry::into_descriptor).collect(),
            data_notes,
            name,
        }
    }

    fn from_descriptor(table: &TableDescriptor) -> Self {
        let data_notes = table
            .data_notes
            .clone()
            .filter(|n| Some(n.as_str()) != builtin_note(&table.name));
        Self {
            description: Some(table.description.clone()),
            has_patient_data: table.has_patient_data,
            has_phi: table.has_phi,
            has_encounter_data: table.has_encounter_data,
            patient_key_column: table.patient_key_column.clone(),
            encounter_key_column: table.encounter_key_column.clone(),
            columns: table.columns.iter().map(ColumnEntry::from_descriptor).collect(),
            data_notes,
        }
    }
}

impl ColumnEntry {
    fn into_descriptor(self) -> ColumnDescriptor {
        let lookup = self
            .lookup_table
            .filter(|t| !t.is_empty())
            .map(|lookup_table| LookupRelation {
                lookup_table,
                lookup_type: self.lookup_type,
            });
        ColumnDescriptor {
            name: self.name,
            description: self.description.unwrap_or_default(),
            data_type: self.data_type,
            ordinal_position: self.ordinal_position,
            lookup,
            queryable: self.queryable,
            note: self.note,
        }
    }

    fn from_descriptor(column: &ColumnDescriptor) -> Self {
        Self {
            name: column.name.clone(),
            description: Some(column.description.clone()),
            data_type: column.data_type.clone(),
            ordinal_position: column.ordinal_position,
            lookup_table: column.lookup.as_ref().map(|l| l.lookup_table.clone()),
            lookup_type: column.lookup.as_ref().and_then(|l| l.lookup_type.clone()),
            queryable: column.queryable,
            note: column.note.clone(),
        }
    }
}

/// Where the catalog reads its document from.
#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Inline(String),
}

/// Lazily loaded, process-lifetime schema index.
///
/// The first successful [`SchemaCatalog::index`] call parses the document;
/// every later call returns the cached index. A failed load leaves the cell
/// empty so the next call retries.
#[derive(Debug)]
pub struct SchemaCatalog {
    source: Source,
    cell: OnceCell<SchemaIndex>,
}

impl SchemaCatalog {
    /// Catalog backed by a file on disk.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
            cell: OnceCell::new(),
        }
    }

    /// Catalog backed by in-memory JSON.
    pub fn from_json(content: impl Into<String>) -> Self {
        Self {
            source: Source::Inline(content.into()),
            cell: OnceCell::new(),
        }
    }

    /// Catalog around an already-built index.
    pub fn from_index(index: SchemaIndex) -> Self {
        Self {
            source: Source::Inline(String::new()),
            cell: OnceCell::with_value(index),
        }
    }

    /// The index, loading it on first use.
    pub fn index(&self) -> Result<&SchemaIndex, SchemaError> {
        self.cell.get_or_try_init(|| self.load())
    }

    /// True once the index has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    fn load(&self) -> Result<SchemaIndex, SchemaError> {
        let document = match &self.source {
            Source::File(path) => {
                tracing::info!(path = %path.display(), "Loading schema reference");
                SchemaDocument::from_path(path)
            }
            Source::Inline(content) => SchemaDocument::from_json(content),
        }
        .inspect_err(|e| tracing::warn!(error = %e, "Schema reference failed to load"))?;

        let index = document.into_index();
        tracing::info!(tables = index.len(), "Schema reference loaded");
        Ok(index)
    }
}
