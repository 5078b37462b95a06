//! The merged schema index and its three access tiers.

use crate::error::SchemaError;
use crate::model::{ColumnDescriptor, TableDescriptor};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// All table descriptors, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaIndex {
    tables: BTreeMap<String, TableDescriptor>,
    /// Lowercased name -> canonical name. First name in order wins.
    folded: HashMap<String, String>,
}

impl SchemaIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table. Columns are re-sorted by ordinal position.
    pub fn add_table(&mut self, mut table: TableDescriptor) {
        table.sort_columns();
        let name = table.name.clone();
        self.tables.insert(name, table);
        self.rebuild_folded();
    }

    /// Build an index from descriptors in one pass.
    pub fn from_tables(tables: impl IntoIterator<Item = TableDescriptor>) -> Self {
        let tables = tables
            .into_iter()
            .map(|mut t| {
                t.sort_columns();
                (t.name.clone(), t)
            })
            .collect();
        let mut index = Self {
            tables,
            folded: HashMap::new(),
        };
        index.rebuild_folded();
        index
    }

    fn rebuild_folded(&mut self) {
        self.folded.clear();
        for name in self.tables.keys() {
            self.folded
                .entry(name.to_lowercase())
                .or_insert_with(|| name.clone());
        }
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no tables are indexed.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.values()
    }

    /// Table names in order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Exact lookup, then case-insensitive.
    pub fn get(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.get(name).or_else(|| {
            self.folded
                .get(&name.to_lowercase())
                .and_then(|canonical| self.tables.get(canonical))
        })
    }

    // =========================================================================
    // TIER 1: OVERVIEW
    // =========================================================================

    /// One summary per table, no column detail.
    pub fn overview(&self) -> Vec<TableSummary> {
        self.tables.values().map(TableSummary::from).collect()
    }

    // =========================================================================
    // TIER 2: DETAIL
    // =========================================================================

    /// Full descriptor for one table.
    pub fn describe(&self, name: &str) -> Result<&TableDescriptor, SchemaError> {
        self.get(name.trim()).ok_or_else(|| SchemaError::TableNotFound {
            table: name.trim().to_string(),
        })
    }

    // =========================================================================
    // TIER 3: SEARCH
    // =========================================================================

    /// Case-insensitive substring search over table and column names and
    /// descriptions.
    pub fn search(&self, keyword: &str) -> Result<SearchOutcome, SchemaError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SchemaError::EmptyKeyword);
        }
        let needle = keyword.to_lowercase();
        let contains = |text: &str| text.to_lowercase().contains(&needle);

        let mut hits = Vec::new();
        for table in self.tables.values() {
            let table_matches = contains(&table.name) || contains(&table.description);
            let matching_columns: Vec<ColumnMatch> = table
                .columns
                .iter()
                .filter(|c| contains(&c.name) || contains(&c.description))
                .map(ColumnMatch::from)
                .collect();

            if table_matches || !matching_columns.is_empty() {
                hits.push(SearchHit {
                    table_name: table.name.clone(),
                    table_description: table.description.clone(),
                    matching_columns,
                });
            }
        }

        tracing::debug!(keyword = %keyword, hits = hits.len(), "Schema search");
        if hits.is_empty() {
            Ok(SearchOutcome::NoMatches {
                keyword: keyword.to_string(),
            })
        } else {
            Ok(SearchOutcome::Matches(hits))
        }
    }
}

/// Overview entry for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table_name: String,
    pub description: String,
    pub has_patient_data: bool,
    pub has_encounter_data: bool,
    pub column_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_key_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_key_column: Option<String>,
}

impl From<&TableDescriptor> for TableSummary {
    fn from(table: &TableDescriptor) -> Self {
        Self {
            table_name: table.name.clone(),
            description: table.description.clone(),
            has_patient_data: table.has_patient_data,
            has_encounter_data: table.has_encounter_data,
            column_count: table.columns.len(),
            patient_key_column: table.patient_key_column.clone(),
            encounter_key_column: table.encounter_key_column.clone(),
        }
    }
}

/// A table that matched a search, directly or through its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub table_name: String,
    pub table_description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matching_columns: Vec<ColumnMatch>,
}

/// A column that matched a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMatch {
    pub column_name: String,
    pub description: String,
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "is_true")]
    pub queryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&ColumnDescriptor> for ColumnMatch {
    fn from(column: &ColumnDescriptor) -> Self {
        Self {
            column_name: column.name.clone(),
            description: column.description.clone(),
            data_type: column.data_type.clone(),
            queryable: column.queryable,
            note: column.note.clone(),
        }
    }
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Result of a schema search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Matches(Vec<SearchHit>),
    NoMatches { keyword: String },
}

impl SearchOutcome {
    /// Hits, empty for `NoMatches`.
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Matches(hits) => hits,
            SearchOutcome::NoMatches { .. } => &[],
        }
    }

    /// Message shown to the caller when nothing matched.
    pub fn no_matches_message(&self) -> Option<String> {
        match self {
            SearchOutcome::Matches(_) => None,
            SearchOutcome::NoMatches { keyword } => {
                Some(format!("No tables or columns matching '{}' found.", keyword))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SchemaIndex {
        let mut patient = TableDescriptor::new("PatientDim");
        patient.description = "Patient demographics, one row per version".to_string();
        patient.has_patient_data = true;
        patient.patient_key_column = Some("PatientDurableKey".to_string());
        patient.columns = vec![
            ColumnDescriptor::new("PatientKey", "bigint"),
            ColumnDescriptor::new("PatientDurableKey", "bigint"),
            ColumnDescriptor::new("BirthDate", "date"),
        ];

        let mut encounter = TableDescriptor::new("EncounterFact");
        encounter.description = "One row per encounter".to_string();
        encounter.has_patient_data = true;
        encounter.has_encounter_data = true;
        let mut date_key = ColumnDescriptor::new("DateKey", "int");
        date_key.description = "Encounter date as YYYYMMDD".to_string();
        encounter.columns = vec![
            ColumnDescriptor::new("EncounterKey", "bigint"),
            ColumnDescriptor::new("PatientDurableKey", "bigint"),
            date_key,
        ];

        let orphan = TableDescriptor::new("OrphanDim");

        SchemaIndex::from_tables([patient, encounter, orphan])
    }

    #[test]
    fn test_overview_has_one_entry_per_table_sorted() {
        let overview = sample_index().overview();
        let names: Vec<_> = overview.iter().map(|s| s.table_name.as_str()).collect();
        assert_eq!(names, vec!["EncounterFact", "OrphanDim", "PatientDim"]);
        assert_eq!(overview[2].column_count, 3);
        assert_eq!(
            overview[2].patient_key_column.as_deref(),
            Some("PatientDurableKey")
        );

        let json = serde_json::to_value(&overview[0]).unwrap();
        assert!(json.get("columns").is_none());
        assert!(json.get("patient_key_column").is_none());
    }

    #[test]
    fn test_describe_exact_then_case_insensitive() {
        let index = sample_index();
        assert_eq!(index.describe("PatientDim").unwrap().name, "PatientDim");
        assert_eq!(index.describe("patientdim").unwrap().name, "PatientDim");
        assert_eq!(index.describe(" ENCOUNTERFACT ").unwrap().columns.len(), 3);
    }

    #[test]
    fn test_describe_not_found_names_overview_tool() {
        let err = sample_index().describe("NoSuchTable").unwrap_err();
        assert!(err.is_not_found());
        let message = err.to_string();
        assert!(message.contains("NoSuchTable"));
        assert!(message.contains("get_database_overview"));
    }

    #[test]
    fn test_search_matches_table_and_columns() {
        let index = sample_index();
        let outcome = index.search("durable").unwrap();
        let names: Vec<_> = outcome.hits().iter().map(|h| h.table_name.as_str()).collect();
        assert_eq!(names, vec!["EncounterFact", "PatientDim"]);
        // Only matching columns are listed.
        for hit in outcome.hits() {
            assert_eq!(hit.matching_columns.len(), 1);
            assert_eq!(hit.matching_columns[0].column_name, "PatientDurableKey");
        }
    }

    #[test]
    fn test_search_matches_descriptions_case_insensitively() {
        let index = sample_index();
        let outcome = index.search("YYYYmmdd").unwrap();
        assert_eq!(outcome.hits().len(), 1);
        assert_eq!(outcome.hits()[0].matching_columns[0].column_name, "DateKey");

        let outcome = index.search("DEMOGRAPHICS").unwrap();
        assert_eq!(outcome.hits()[0].table_name, "PatientDim");
        assert!(outcome.hits()[0].matching_columns.is_empty());
    }

    #[test]
    fn test_search_no_matches_is_explicit() {
        let outcome = sample_index().search("zzzz").unwrap();
        assert!(outcome.hits().is_empty());
        assert_eq!(
            outcome.no_matches_message().unwrap(),
            "No tables or columns matching 'zzzz' found."
        );
    }

    #[test]
    fn test_search_rejects_blank_keyword() {
        assert!(matches!(
            sample_index().search("   "),
            Err(SchemaError::EmptyKeyword)
        ));
    }

    #[test]
    fn test_add_table_replaces_existing() {
        let mut index = sample_index();
        let mut replacement = TableDescriptor::new("PatientDim");
        replacement.description = "replaced".to_string();
        index.add_table(replacement);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("patientdim").unwrap().description, "replaced");
    }
}
