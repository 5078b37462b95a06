//! Building the schema document from data dictionary exports.
//!
//! The dictionary ships as a workbook with a `Tables` sheet and a `Columns`
//! sheet. Each sheet is exported to CSV and merged here. Every table named
//! by either sheet ends up in the result exactly once; a table that only
//! has column rows gets an empty description and all flags false.

use crate::error::SchemaError;
use crate::index::SchemaIndex;
use crate::loader::ordinal_from_f64;
use crate::model::{ColumnDescriptor, LookupRelation, TableDescriptor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// A row of the `Tables` sheet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableRecord {
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub table_description: Option<String>,
    #[serde(default)]
    pub has_pat_specific_data: Option<String>,
    #[serde(default, rename = "has_PHI")]
    pub has_phi: Option<String>,
    #[serde(default)]
    pub has_enc_specific_data: Option<String>,
    #[serde(default, rename = "PatientKey_Col")]
    pub patient_key_col: Option<String>,
    #[serde(default, rename = "EncounterKey_Col")]
    pub encounter_key_col: Option<String>,
}

/// A row of the `Columns` sheet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnRecord {
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub column_description: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub ordinal_position: Option<String>,
    #[serde(default, rename = "lookupTableName")]
    pub lookup_table_name: Option<String>,
    #[serde(default, rename = "lookupType")]
    pub lookup_type: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| v.trim().eq_ignore_ascii_case("Y"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Merge table and column records into an index.
///
/// Rows without a table name are skipped. A repeated table row replaces the
/// earlier one.
pub fn merge_records(
    tables: impl IntoIterator<Item = TableRecord>,
    columns: impl IntoIterator<Item = ColumnRecord>,
) -> SchemaIndex {
    let mut merged: BTreeMap<String, TableDescriptor> = BTreeMap::new();

    for record in tables {
        let Some(name) = non_empty(record.table_name.clone()) else {
            continue;
        };
        let mut table = TableDescriptor::new(name.clone());
        table.description = non_empty(record.table_description.clone()).unwrap_or_default();
        table.has_patient_data = flag(&record.has_pat_specific_data);
        table.has_phi = flag(&record.has_phi);
        table.has_encounter_data = flag(&record.has_enc_specific_data);
        table.patient_key_column = non_empty(record.patient_key_col);
        table.encounter_key_column = non_empty(record.encounter_key_col);
        merged.insert(name, table);
    }

    let mut skipped = 0usize;
    for record in columns {
        let (Some(table_name), Some(column_name)) = (
            non_empty(record.table_name),
            non_empty(record.column_name),
        ) else {
            skipped += 1;
            continue;
        };
        let lookup = non_empty(record.lookup_table_name).map(|lookup_table| LookupRelation {
            lookup_table,
            lookup_type: non_empty(record.lookup_type),
        });
        let column = ColumnDescriptor {
            name: column_name,
            description: non_empty(record.column_description).unwrap_or_default(),
            data_type: non_empty(record.data_type),
            ordinal_position: record
                .ordinal_position
                .as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .and_then(ordinal_from_f64),
            lookup,
            queryable: true,
            note: None,
        };
        merged
            .entry(table_name.clone())
            .or_insert_with(|| TableDescriptor::new(table_name))
            .columns
            .push(column);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Skipped column rows without a table or column name");
    }

    SchemaIndex::from_tables(merged.into_values())
}

/// Read CSV records of one sheet from any reader.
pub fn read_records<T, R>(reader: R) -> Result<Vec<T>, csv::Error>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
        .deserialize()
        .collect()
}

/// Read both sheet exports and merge them.
pub fn read_dictionary(
    tables_csv: impl AsRef<Path>,
    columns_csv: impl AsRef<Path>,
) -> Result<SchemaIndex, SchemaError> {
    let tables: Vec<TableRecord> = read_path(tables_csv.as_ref())?;
    let columns: Vec<ColumnRecord> = read_path(columns_csv.as_ref())?;
    tracing::info!(
        table_rows = tables.len(),
        column_rows = columns.len(),
        "Merging data dictionary"
    );
    Ok(merge_records(tables, columns))
}

fn read_path<T>(path: &Path) -> Result<Vec<T>, SchemaError>
where
    T: for<'de> Deserialize<'de>,
{
    let wrap = |source: csv::Error| SchemaError::Dictionary {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(|e| wrap(csv::Error::from(e)))?;
    read_records(file).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLES: &str = "\
table_name,table_description,has_pat_specific_data,has_PHI,has_enc_specific_data,PatientKey_Col,EncounterKey_Col
PatientDim,Patient demographics,Y,Y,N,PatientDurableKey,
EncounterFact,One row per encounter,Y,N,Y,PatientDurableKey,EncounterKey
,orphan row with no name,Y,Y,Y,,
";

    const COLUMNS: &str = "\
table_name,column_name,column_description,data_type,ordinal_position,lookupTableName,lookupType
PatientDim,PatientDurableKey,Stable key,bigint,2,,
PatientDim,PatientKey,Version key,bigint,1,,
EncounterFact,DateKey,Encounter date,int,3.0,DateDim,FK
ColumnOnlyFact,SomeColumn,Only in the columns sheet,varchar,1,,
,Ignored,no table,int,1,,
";

    fn merged() -> SchemaIndex {
        let tables: Vec<TableRecord> = read_records(TABLES.as_bytes()).unwrap();
        let columns: Vec<ColumnRecord> = read_records(COLUMNS.as_bytes()).unwrap();
        merge_records(tables, columns)
    }

    #[test]
    fn test_merge_keeps_every_table_once() {
        let index = merged();
        assert_eq!(
            index.table_names(),
            vec!["ColumnOnlyFact", "EncounterFact", "PatientDim"]
        );
    }

    #[test]
    fn test_column_only_table_has_defaults() {
        let index = merged();
        let table = index.get("ColumnOnlyFact").unwrap();
        assert_eq!(table.description, "");
        assert!(!table.has_patient_data && !table.has_phi && !table.has_encounter_data);
        assert_eq!(table.columns.len(), 1);
    }

    #[test]
    fn test_flags_and_keys() {
        let index = merged();
        let patient = index.get("PatientDim").unwrap();
        assert!(patient.has_patient_data);
        assert!(patient.has_phi);
        assert!(!patient.has_encounter_data);
        assert_eq!(patient.patient_key_column.as_deref(), Some("PatientDurableKey"));
        assert_eq!(patient.encounter_key_column, None);

        let names: Vec<_> = patient.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["PatientKey", "PatientDurableKey"]);
    }

    #[test]
    fn test_lookup_and_float_ordinal() {
        let index = merged();
        let date_key = index.get("EncounterFact").unwrap().get_column("DateKey").unwrap();
        assert_eq!(date_key.ordinal_position, Some(3));
        let lookup = date_key.lookup.as_ref().unwrap();
        assert_eq!(lookup.lookup_table, "DateDim");
        assert_eq!(lookup.lookup_type.as_deref(), Some("FK"));
    }

    #[test]
    fn test_read_dictionary_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let tables = dir.path().join("tables.csv");
        let columns = dir.path().join("columns.csv");
        std::fs::write(&tables, TABLES).unwrap();
        std::fs::write(&columns, COLUMNS).unwrap();

        let index = read_dictionary(&tables, &columns).unwrap();
        assert_eq!(index.len(), 3);

        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            read_dictionary(&missing, &columns),
            Err(SchemaError::Dictionary { .. })
        ));
    }
}
