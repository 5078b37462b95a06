//! Checks against the bundled schema reference document.

use cdw_schema::{SchemaCatalog, SearchOutcome};
use std::path::PathBuf;

fn reference_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/schema_reference.json")
}

#[test]
fn test_bundled_reference_loads() {
    let catalog = SchemaCatalog::from_path(reference_path());
    let index = catalog.index().expect("bundled reference parses");
    assert!(index.len() >= 10);

    for table in [
        "PatientDim",
        "EncounterFact",
        "MedicationOrderFact",
        "DiagnosisEventFact",
        "LabComponentResultFact",
        "note_metadata",
        "note_text",
    ] {
        assert!(index.get(table).is_some(), "missing {table}");
    }
}

#[test]
fn test_patient_facts_carry_stable_key() {
    let catalog = SchemaCatalog::from_path(reference_path());
    let index = catalog.index().unwrap();
    for table in [
        "EncounterFact",
        "MedicationOrderFact",
        "DiagnosisEventFact",
        "LabComponentResultFact",
    ] {
        let table = index.get(table).unwrap();
        assert_eq!(
            table.patient_key_column.as_deref(),
            Some("PatientDurableKey"),
            "{}",
            table.name
        );
        assert!(table.get_column("PatientDurableKey").is_some());
    }
}

#[test]
fn test_patient_dim_has_slowly_changing_note() {
    let catalog = SchemaCatalog::from_path(reference_path());
    let patient = catalog.index().unwrap().describe("patientdim").unwrap();
    let notes = patient.data_notes.as_deref().unwrap();
    assert!(notes.contains("PatientKey"));
    assert!(notes.contains("PatientDurableKey"));
}

#[test]
fn test_search_flags_derived_columns() {
    let catalog = SchemaCatalog::from_path(reference_path());
    let outcome = catalog.index().unwrap().search("DateKeyValue").unwrap();
    let SearchOutcome::Matches(hits) = outcome else {
        panic!("expected matches");
    };
    let derived: Vec<_> = hits
        .iter()
        .flat_map(|h| h.matching_columns.iter())
        .filter(|c| !c.queryable)
        .collect();
    assert!(!derived.is_empty());
    assert!(derived.iter().all(|c| c.note.is_some()));
}
