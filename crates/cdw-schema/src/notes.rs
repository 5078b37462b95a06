//! Built-in data-quality notes for tables with known pitfalls.

/// Note for a table, if the warehouse has a known pitfall there.
///
/// A `data_notes` entry in the reference document takes precedence.
pub fn builtin_note(table: &str) -> Option<&'static str> {
    match table {
        "PatientDim" => Some(
            "Slowly-changing dimension (type 2): a patient has one row per historical \
             version. PatientKey identifies a single version and only matches fact rows \
             recorded while that version was current. Use PatientDurableKey to find all \
             of a patient's data, and filter IsCurrent = 1 for the current demographics.",
        ),
        "LabComponentResultFact" => Some(
            "NumericValue is blanked by de-identification for most results. Use the Value \
             column (text) for the reported result and cast where a number is needed. \
             ResultDateKey values of 0 or below mark unknown dates.",
        ),
        "LabComponentDim" => Some(
            "The LOINC code for a component is in LoincCode; join on LabComponentKey.",
        ),
        "MedicationDim" => Some(
            "Legacy records carry '*Unspecified' in name and class columns. Prefer \
             MedicationCodeDim or filter those values out when grouping.",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_notes() {
        assert!(builtin_note("PatientDim").unwrap().contains("PatientDurableKey"));
        assert!(builtin_note("LabComponentResultFact").unwrap().contains("Value"));
        assert!(builtin_note("LabComponentDim").unwrap().contains("LoincCode"));
        assert!(builtin_note("MedicationDim").unwrap().contains("*Unspecified"));
        assert!(builtin_note("EncounterFact").is_none());
    }
}
