//! Catalog of per-patient intents.

use crate::spec::IntentKind;
use cdw_schema::{SchemaIndex, TableDescriptor};

/// Stable patient identifier, constant across every dimension version.
pub const STABLE_KEY: &str = "PatientDurableKey";

/// Version-scoped patient identifier.
pub const VERSION_KEY: &str = "PatientKey";

/// The patient dimension.
pub const PATIENT_DIM: &str = "PatientDim";

/// Per-patient entities with a canned query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientEntity {
    Demographics,
    Encounters,
    Medications,
    Diagnoses,
    Labs,
}

impl PatientEntity {
    pub const ALL: [PatientEntity; 5] = [
        PatientEntity::Demographics,
        PatientEntity::Encounters,
        PatientEntity::Medications,
        PatientEntity::Diagnoses,
        PatientEntity::Labs,
    ];

    /// Table, ordering and date key for this entity.
    pub fn definition(&self) -> IntentDefinition {
        match self {
            PatientEntity::Demographics => IntentDefinition {
                entity: *self,
                table: PATIENT_DIM,
                date_key: None,
                order_by: &[("IsCurrent", true), ("StartDate", true)],
            },
            PatientEntity::Encounters => IntentDefinition {
                entity: *self,
                table: "EncounterFact",
                date_key: Some("DateKey"),
                order_by: &[("DateKey", true)],
            },
            PatientEntity::Medications => IntentDefinition {
                entity: *self,
                table: "MedicationOrderFact",
                date_key: Some("OrderedDateKey"),
                order_by: &[("OrderedDateKey", true)],
            },
            PatientEntity::Diagnoses => IntentDefinition {
                entity: *self,
                table: "DiagnosisEventFact",
                date_key: Some("StartDateKey"),
                order_by: &[("StartDateKey", true)],
            },
            PatientEntity::Labs => IntentDefinition {
                entity: *self,
                table: "LabComponentResultFact",
                date_key: Some("ResultDateKey"),
                order_by: &[("ResultDateKey", true)],
            },
        }
    }

    pub fn kind(&self) -> IntentKind {
        match self {
            PatientEntity::Demographics => IntentKind::Demographics,
            PatientEntity::Encounters => IntentKind::Encounters,
            PatientEntity::Medications => IntentKind::Medications,
            PatientEntity::Diagnoses => IntentKind::Diagnoses,
            PatientEntity::Labs => IntentKind::Labs,
        }
    }
}

/// Static description of a per-patient intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentDefinition {
    pub entity: PatientEntity,
    pub table: &'static str,
    /// Integer date-key column used for range filters.
    pub date_key: Option<&'static str>,
    /// `(column, descending)` pairs, most recent first.
    pub order_by: &'static [(&'static str, bool)],
}

impl IntentDefinition {
    /// How this intent's table reaches the stable key, according to the
    /// schema index. Tables the index does not know are assumed to carry
    /// the stable key directly.
    pub fn link(&self, index: Option<&SchemaIndex>) -> PatientLink {
        if self.table == PATIENT_DIM {
            return PatientLink::Direct;
        }
        index
            .and_then(|i| i.get(self.table))
            .map(PatientLink::for_table)
            .unwrap_or(PatientLink::Direct)
    }
}

/// How a fact table is constrained to one patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientLink {
    /// The table carries `PatientDurableKey`; filter on it.
    Direct,
    /// The table only carries `PatientKey`; keep rows whose version belongs
    /// to the patient via `EXISTS` on the dimension.
    Exists,
}

impl PatientLink {
    /// Pick the link for a table from its columns.
    pub fn for_table(table: &TableDescriptor) -> Self {
        let has = |name: &str| {
            table
                .get_column(name)
                .is_some_and(|c| c.queryable)
        };
        if has(STABLE_KEY) || !has(VERSION_KEY) {
            PatientLink::Direct
        } else {
            PatientLink::Exists
        }
    }
}
