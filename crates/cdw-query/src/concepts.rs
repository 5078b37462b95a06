//! Concept lookups across the terminology dimensions.
//!
//! Diagnosis, procedure and medication codes live in three differently
//! shaped tables. Each lookup selects from them with a common row shape
//! (`domain, concept_key, vocabulary, code, name`) combined by `UNION ALL`.

use crate::constructor::{QueryConstructor, SEARCH_ROW_LIMIT, like_pattern, non_blank};
use crate::error::QueryError;
use crate::spec::{CannedIntent, IntentKind, QuerySpec};
use cdw_policy::quote_literal;
use std::fmt;
use std::str::FromStr;

/// A terminology domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConceptDomain {
    Diagnosis,
    Procedure,
    Medication,
}

impl ConceptDomain {
    pub const ALL: [ConceptDomain; 3] = [
        ConceptDomain::Diagnosis,
        ConceptDomain::Procedure,
        ConceptDomain::Medication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptDomain::Diagnosis => "diagnosis",
            ConceptDomain::Procedure => "procedure",
            ConceptDomain::Medication => "medication",
        }
    }

    /// The domain a well-known vocabulary belongs to.
    pub fn for_vocabulary(vocabulary: &str) -> Option<Self> {
        match vocabulary.trim().to_uppercase().as_str() {
            "ICD-9-CM" | "ICD-10-CM" | "SNOMED" => Some(ConceptDomain::Diagnosis),
            "CPT" | "HCPCS" => Some(ConceptDomain::Procedure),
            "NDC" | "RXNORM" | "GPI" => Some(ConceptDomain::Medication),
            _ => None,
        }
    }

    fn columns(&self) -> DomainColumns {
        match self {
            ConceptDomain::Diagnosis => DomainColumns {
                from: "\"DiagnosisTerminologyDim\" dt \
                       LEFT JOIN \"DiagnosisDim\" dd ON dd.\"DiagnosisKey\" = dt.\"DiagnosisKey\"",
                concept_key: "dt.\"DiagnosisKey\"",
                vocabulary: "dt.\"Type\"",
                code: "dt.\"Value\"",
                name: "COALESCE(dd.\"Name\", dt.\"DisplayString\")",
                searchable: &["dt.\"Value\"", "dt.\"DisplayString\"", "dd.\"Name\""],
            },
            ConceptDomain::Procedure => DomainColumns {
                from: "\"ProcedureTerminologyDim\" pt",
                concept_key: "pt.\"ProcedureKey\"",
                vocabulary: "pt.\"CodeSet\"",
                code: "pt.\"Code\"",
                name: "pt.\"Name\"",
                searchable: &["pt.\"Code\"", "pt.\"Name\""],
            },
            ConceptDomain::Medication => DomainColumns {
                from: "\"MedicationCodeDim\" mc",
                concept_key: "mc.\"MedicationKey\"",
                vocabulary: "mc.\"Type\"",
                code: "mc.\"Code\"",
                name: "mc.\"MedicationName\"",
                searchable: &[
                    "mc.\"Code\"",
                    "mc.\"MedicationName\"",
                    "mc.\"MedicationGenericName\"",
                ],
            },
        }
    }
}

impl fmt::Display for ConceptDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConceptDomain {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diagnosis" => Ok(ConceptDomain::Diagnosis),
            "procedure" => Ok(ConceptDomain::Procedure),
            "medication" => Ok(ConceptDomain::Medication),
            other => Err(QueryError::invalid_argument(format!(
                "relationship_type must be one of diagnosis, medication, procedure; got '{}'",
                other
            ))),
        }
    }
}

struct DomainColumns {
    from: &'static str,
    concept_key: &'static str,
    vocabulary: &'static str,
    code: &'static str,
    name: &'static str,
    searchable: &'static [&'static str],
}

/// Which domains a code lookup covers and how the vocabulary is filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyScope {
    pub domains: Vec<ConceptDomain>,
    pub vocabulary: Option<String>,
}

impl VocabularyScope {
    /// Known vocabularies narrow to their domain; unknown ones filter every
    /// domain's vocabulary column.
    pub fn resolve(vocabulary: Option<&str>) -> Self {
        let vocabulary = vocabulary.map(str::trim).filter(|v| !v.is_empty());
        match vocabulary {
            None => Self {
                domains: ConceptDomain::ALL.to_vec(),
                vocabulary: None,
            },
            Some(v) => Self {
                domains: ConceptDomain::for_vocabulary(v)
                    .map(|d| vec![d])
                    .unwrap_or_else(|| ConceptDomain::ALL.to_vec()),
                vocabulary: Some(v.to_string()),
            },
        }
    }
}

impl QueryConstructor {
    /// Exact code lookup, optionally narrowed by source vocabulary.
    pub fn map_to_standard(
        &self,
        code: &str,
        source_vocabulary: Option<&str>,
        row_limit: Option<u64>,
    ) -> Result<QuerySpec, QueryError> {
        let code = non_blank("code", code)?;
        let scope = VocabularyScope::resolve(source_vocabulary);
        let limit = self.row_limit_or(row_limit, SEARCH_ROW_LIMIT);

        let branches = scope.domains.iter().map(|domain| {
            let cols = domain.columns();
            let mut predicate = format!("{} = {}", cols.code, quote_literal(code));
            if let Some(vocabulary) = &scope.vocabulary {
                predicate.push_str(&format!(
                    " AND UPPER({}) = UPPER({})",
                    cols.vocabulary,
                    quote_literal(vocabulary)
                ));
            }
            branch(*domain, &cols, &predicate)
        });

        let sql = union(branches, limit);
        tracing::debug!(code = %code, domains = scope.domains.len(), "Built concept map query");
        Ok(QuerySpec::canned(
            sql,
            limit,
            CannedIntent::new(IntentKind::ConceptMap, code),
        ))
    }

    /// Substring search over codes and names, optionally in one domain.
    pub fn find_related_concepts(
        &self,
        concept: &str,
        relationship_type: Option<&str>,
        row_limit: Option<u64>,
    ) -> Result<QuerySpec, QueryError> {
        let concept = non_blank("concept", concept)?;
        let domains = match relationship_type.map(str::trim).filter(|r| !r.is_empty()) {
            Some(r) => vec![r.parse::<ConceptDomain>()?],
            None => ConceptDomain::ALL.to_vec(),
        };
        let limit = self.row_limit_or(row_limit, SEARCH_ROW_LIMIT);
        let pattern = quote_literal(&like_pattern(concept));

        let branches = domains.iter().map(|domain| {
            let cols = domain.columns();
            let predicate = cols
                .searchable
                .iter()
                .map(|column| format!("{} ILIKE {}", column, pattern))
                .collect::<Vec<_>>()
                .join(" OR ");
            branch(*domain, &cols, &format!("({})", predicate))
        });

        let sql = union(branches, limit);
        Ok(QuerySpec::canned(
            sql,
            limit,
            CannedIntent::new(IntentKind::ConceptSearch, concept),
        ))
    }
}

fn branch(domain: ConceptDomain, cols: &DomainColumns, predicate: &str) -> String {
    format!(
        "SELECT '{}' AS \"domain\", CAST({} AS VARCHAR) AS \"concept_key\", {} AS \"vocabulary\", \
         {} AS \"code\", {} AS \"name\" FROM {} WHERE {}",
        domain, cols.concept_key, cols.vocabulary, cols.code, cols.name, cols.from, predicate
    )
}

fn union(branches: impl Iterator<Item = String>, limit: u64) -> String {
    format!(
        "SELECT * FROM ({}) c ORDER BY c.\"domain\", c.\"vocabulary\", c.\"code\" LIMIT {}",
        branches.collect::<Vec<_>>().join(" UNION ALL "),
        limit
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdw_core::LimitsConfig;
    use cdw_policy::QueryValidator;

    fn constructor() -> QueryConstructor {
        QueryConstructor::new(LimitsConfig::default())
    }

    #[test]
    fn test_vocabulary_routing() {
        assert_eq!(
            ConceptDomain::for_vocabulary("icd-10-cm"),
            Some(ConceptDomain::Diagnosis)
        );
        assert_eq!(ConceptDomain::for_vocabulary("CPT"), Some(ConceptDomain::Procedure));
        assert_eq!(ConceptDomain::for_vocabulary("RxNorm"), Some(ConceptDomain::Medication));
        assert_eq!(ConceptDomain::for_vocabulary("LOINC"), None);

        let scope = VocabularyScope::resolve(Some("LOINC"));
        assert_eq!(scope.domains.len(), 3);
        assert_eq!(scope.vocabulary.as_deref(), Some("LOINC"));
        assert_eq!(VocabularyScope::resolve(Some(" ")).vocabulary, None);
    }

    #[test]
    fn test_map_to_standard_all_domains() {
        let spec = constructor().map_to_standard("E11.9", None, None).unwrap();
        assert_eq!(spec.sql.matches("UNION ALL").count(), 2);
        assert!(spec.sql.contains("dt.\"Value\" = 'E11.9'"));
        assert!(spec.sql.contains("pt.\"Code\" = 'E11.9'"));
        assert!(spec.sql.contains("mc.\"Code\" = 'E11.9'"));
        assert!(spec.sql.ends_with("LIMIT 50"));
        assert!(QueryValidator::new().is_read_only(&spec.sql), "{}", spec.sql);
    }

    #[test]
    fn test_map_to_standard_narrows_by_vocabulary() {
        let spec = constructor()
            .map_to_standard("99213", Some("CPT"), None)
            .unwrap();
        assert!(!spec.sql.contains("UNION ALL"));
        assert!(spec.sql.contains("\"ProcedureTerminologyDim\""));
        assert!(spec.sql.contains("UPPER(pt.\"CodeSet\") = UPPER('CPT')"));
        assert!(QueryValidator::new().is_read_only(&spec.sql));
    }

    #[test]
    fn test_find_related_concepts() {
        let spec = constructor()
            .find_related_concepts("metformin", Some("medication"), Some(10))
            .unwrap();
        assert!(spec.sql.contains("mc.\"MedicationGenericName\" ILIKE '%metformin%'"));
        assert!(!spec.sql.contains("DiagnosisTerminologyDim"));
        assert_eq!(spec.row_limit, 10);
        assert!(QueryValidator::new().is_read_only(&spec.sql));

        let spec = constructor()
            .find_related_concepts("diabetes", None, None)
            .unwrap();
        assert_eq!(spec.sql.matches("UNION ALL").count(), 2);
    }

    #[test]
    fn test_find_related_concepts_rejects_unknown_domain() {
        assert!(matches!(
            constructor().find_related_concepts("x", Some("allergy"), None),
            Err(QueryError::InvalidArgument(_))
        ));
    }
}
