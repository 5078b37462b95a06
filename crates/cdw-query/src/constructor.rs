//! The query constructor: per-patient facts, notes and cohorts.

use crate::date_key::DateRange;
use crate::error::QueryError;
use crate::intent::{PATIENT_DIM, PatientEntity, PatientLink, STABLE_KEY, VERSION_KEY};
use crate::spec::{CannedIntent, IntentKind, QuerySpec};
use cdw_core::LimitsConfig;
use cdw_policy::{QueryValidator, quote_literal, validate_key_value};
use cdw_schema::SchemaIndex;

/// Default row bound for note, concept and search intents.
pub const SEARCH_ROW_LIMIT: u64 = 50;

/// Characters of note text returned by a note search.
pub const NOTE_SNIPPET_LENGTH: usize = 500;

/// Builds [`QuerySpec`]s for canned intents. Never executes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryConstructor {
    limits: LimitsConfig,
}

impl QueryConstructor {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Row bound with the configured default.
    pub fn row_limit(&self, requested: Option<u64>) -> u64 {
        self.limits.resolve(requested)
    }

    /// Row bound with an intent-specific default.
    pub(crate) fn row_limit_or(&self, requested: Option<u64>, default: u64) -> u64 {
        self.limits.resolve(Some(requested.unwrap_or(default)))
    }

    /// Caller SQL, bounded but otherwise untouched.
    pub fn free_form(&self, sql: &str, row_limit: Option<u64>) -> QuerySpec {
        QuerySpec::free_form(sql, self.row_limit(row_limit))
    }

    // =========================================================================
    // PER-PATIENT FACTS
    // =========================================================================

    /// Current and historical demographic rows, current version first.
    pub fn demographics(
        &self,
        patient_durable_key: &str,
        row_limit: Option<u64>,
    ) -> Result<QuerySpec, QueryError> {
        self.patient_query(
            PatientEntity::Demographics,
            patient_durable_key,
            DateRange::unbounded(),
            row_limit,
            None,
        )
    }

    /// Rows of one patient's facts, most recent first.
    ///
    /// `index` decides how the fact table reaches the stable key; see
    /// [`PatientLink`].
    pub fn patient_query(
        &self,
        entity: PatientEntity,
        patient_durable_key: &str,
        range: DateRange,
        row_limit: Option<u64>,
        index: Option<&SchemaIndex>,
    ) -> Result<QuerySpec, QueryError> {
        let key = validate_key_value(STABLE_KEY, patient_durable_key)?;
        let definition = entity.definition();
        let link = definition.link(index);
        let limit = self.row_limit(row_limit);

        let mut predicates = vec![match link {
            PatientLink::Direct => format!("f.{} = {}", ident(STABLE_KEY), quote_literal(key)),
            PatientLink::Exists => format!(
                "EXISTS (SELECT 1 FROM {dim} p WHERE p.{version} = f.{version} AND p.{stable} = {key})",
                dim = ident(PATIENT_DIM),
                version = ident(VERSION_KEY),
                stable = ident(STABLE_KEY),
                key = quote_literal(key),
            ),
        }];

        match definition.date_key {
            Some(column) => predicates.extend(range.predicates(&format!("f.{}", ident(column)))),
            None if !range.is_unbounded() => {
                return Err(QueryError::invalid_argument(format!(
                    "{} does not support a date range",
                    entity.kind()
                )));
            }
            None => {}
        }

        let order_by = definition
            .order_by
            .iter()
            .map(|(column, descending)| {
                format!("f.{} {}", ident(column), if *descending { "DESC" } else { "ASC" })
            })
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "SELECT f.* FROM {} f WHERE {} ORDER BY {} LIMIT {}",
            ident(definition.table),
            predicates.join(" AND "),
            order_by,
            limit
        );

        tracing::debug!(
            intent = %entity.kind(),
            link = ?link,
            row_limit = limit,
            "Built patient query"
        );
        Ok(QuerySpec::canned(
            sql,
            limit,
            CannedIntent::new(entity.kind(), key),
        ))
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    /// Notes for a patient whose text contains `keyword`, newest first, with
    /// a snippet of the text.
    pub fn search_notes(
        &self,
        patient_durable_key: &str,
        keyword: &str,
        row_limit: Option<u64>,
    ) -> Result<QuerySpec, QueryError> {
        let key = validate_key_value(STABLE_KEY, patient_durable_key)?;
        let keyword = non_blank("keyword", keyword)?;
        let limit = self.row_limit_or(row_limit, SEARCH_ROW_LIMIT);

        let sql = format!(
            "SELECT nm.\"deid_note_key\", nm.\"note_type\", nm.\"encounter_type\", \
             nm.\"enc_dept_specialty\", nm.\"deid_service_date\", \
             SUBSTRING(nt.\"note_text\" FROM 1 FOR {snippet}) AS \"note_snippet\" \
             FROM \"note_metadata\" nm \
             JOIN \"note_text\" nt ON nm.\"deid_note_key\" = nt.\"deid_note_key\" \
             WHERE nm.{stable} = {key} AND nt.\"note_text\" ILIKE {pattern} \
             ORDER BY nm.\"deid_service_date\" DESC LIMIT {limit}",
            snippet = NOTE_SNIPPET_LENGTH,
            stable = ident(STABLE_KEY),
            key = quote_literal(key),
            pattern = quote_literal(&like_pattern(keyword)),
            limit = limit,
        );

        Ok(QuerySpec::canned(
            sql,
            limit,
            CannedIntent::new(IntentKind::NoteSearch, key),
        ))
    }

    /// Full text and metadata of one note.
    pub fn get_note(&self, note_key: &str) -> Result<QuerySpec, QueryError> {
        let key = validate_key_value("note_key", note_key)?;
        let sql = format!(
            "SELECT nm.\"deid_note_key\", nm.\"note_type\", nm.\"encounter_type\", \
             nm.\"enc_dept_specialty\", nm.\"deid_service_date\", nt.\"note_text\" \
             FROM \"note_metadata\" nm \
             JOIN \"note_text\" nt ON nm.\"deid_note_key\" = nt.\"deid_note_key\" \
             WHERE nm.\"deid_note_key\" = {} LIMIT 1",
            quote_literal(key)
        );
        Ok(QuerySpec::canned(
            sql,
            1,
            CannedIntent::new(IntentKind::Note, key),
        ))
    }

    // =========================================================================
    // COHORTS
    // =========================================================================

    /// Distinct patients in `PatientDim` matching a caller WHERE clause.
    ///
    /// The clause is checked as `SELECT 1 WHERE <clause>` before it is
    /// embedded.
    pub fn cohort_summary(&self, where_clause: &str) -> Result<QuerySpec, QueryError> {
        let clause = non_blank("sql_filter", where_clause)?;
        QueryValidator::new().validate(&format!("SELECT 1 WHERE {}", clause))?;

        let sql = format!(
            "SELECT COUNT(DISTINCT p.{}) AS \"patient_count\" FROM {} p WHERE {}",
            ident(STABLE_KEY),
            ident(PATIENT_DIM),
            clause
        );
        Ok(QuerySpec::canned(
            sql,
            1,
            CannedIntent::new(IntentKind::CohortSummary, clause),
        ))
    }
}

/// Double-quote a compile-time identifier.
pub(crate) fn ident(name: &str) -> String {
    format!("\"{}\"", name)
}

/// `%term%` with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub(crate) fn non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, QueryError> {
    let value = value.trim();
    if value.is_empty() {
        Err(QueryError::invalid_argument(format!("{} must not be empty", field)))
    } else {
        Ok(value)
    }
}
