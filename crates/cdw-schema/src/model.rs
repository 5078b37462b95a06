//! Table and column descriptors.

use serde::{Deserialize, Serialize};

/// Metadata for one warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name, unique within the index.
    #[serde(rename = "table_name")]
    pub name: String,

    /// Free-text description. Empty when the dictionary only lists columns.
    pub description: String,

    /// Rows are tied to a specific patient.
    pub has_patient_data: bool,

    /// Table carries protected health information.
    pub has_phi: bool,

    /// Rows are tied to a specific encounter.
    pub has_encounter_data: bool,

    /// Column holding the stable patient key, if any.
    pub patient_key_column: Option<String>,

    /// Column holding the encounter key, if any.
    pub encounter_key_column: Option<String>,

    /// Columns ordered by ordinal position.
    pub columns: Vec<ColumnDescriptor>,

    /// Data-quality guidance surfaced with the table detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_notes: Option<String>,
}

impl TableDescriptor {
    /// Create an empty descriptor for a table known only by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            has_patient_data: false,
            has_phi: false,
            has_encounter_data: false,
            patient_key_column: None,
            encounter_key_column: None,
            columns: Vec::new(),
            data_notes: None,
        }
    }

    /// Get a column by name, falling back to a case-insensitive match.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    /// Columns that exist in the SQL view.
    pub fn queryable_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.queryable)
    }

    /// Sort columns by ordinal position; unnumbered columns keep their
    /// relative order after the numbered ones.
    pub(crate) fn sort_columns(&mut self) {
        self.columns
            .sort_by_key(|c| (c.ordinal_position.is_none(), c.ordinal_position));
    }
}

/// Metadata for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Free-text description.
    pub description: String,

    /// Declared data type.
    pub data_type: Option<String>,

    /// 1-based position in the table.
    pub ordinal_position: Option<u32>,

    /// Foreign-key-like reference to a lookup table.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupRelation>,

    /// False for derived dictionary columns missing from the SQL view.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub queryable: bool,

    /// Guidance for non-queryable columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ColumnDescriptor {
    /// Create a queryable column with only a name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            data_type: Some(data_type.into()),
            ordinal_position: None,
            lookup: None,
            queryable: true,
            note: None,
        }
    }
}

/// Reference from a column to a lookup (dimension) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRelation {
    /// The referenced table.
    pub lookup_table: String,

    /// Relationship kind as recorded in the dictionary.
    pub lookup_type: Option<String>,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_columns_by_ordinal() {
        let mut table = TableDescriptor::new("EncounterFact");
        let mut c = ColumnDescriptor::new("C", "int");
        c.ordinal_position = Some(3);
        let mut a = ColumnDescriptor::new("A", "int");
        a.ordinal_position = Some(1);
        let loose = ColumnDescriptor::new("Loose", "int");
        table.columns = vec![loose, c, a];

        table.sort_columns();
        let names: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "Loose"]);
    }

    #[test]
    fn test_column_serialization_shape() {
        let mut column = ColumnDescriptor::new("PatientKey", "bigint");
        column.lookup = Some(LookupRelation {
            lookup_table: "PatientDim".to_string(),
            lookup_type: Some("FK".to_string()),
        });
        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["lookup_table"], json!("PatientDim"));
        assert_eq!(value["lookup_type"], json!("FK"));
        assert!(value.get("queryable").is_none());

        column.queryable = false;
        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["queryable"], json!(false));
    }

    #[test]
    fn test_get_column_case_insensitive() {
        let mut table = TableDescriptor::new("PatientDim");
        table.columns.push(ColumnDescriptor::new("PatientDurableKey", "bigint"));
        assert!(table.get_column("PatientDurableKey").is_some());
        assert!(table.get_column("patientdurablekey").is_some());
        assert!(table.get_column("Missing").is_none());
    }
}
