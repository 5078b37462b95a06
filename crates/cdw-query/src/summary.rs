//! Table summaries: row count and per-column null counts in one statement.

use crate::constructor::QueryConstructor;
use crate::error::QueryError;
use crate::spec::{CannedIntent, IntentKind, QuerySpec};
use cdw_policy::{quote_identifier, validate_identifier};
use cdw_schema::SchemaIndex;

/// Columns summarized per table.
pub const MAX_SUMMARY_COLUMNS: usize = 50;

/// A summary statement and the columns its result cells line up with.
///
/// The single result row holds the row count followed by one null count per
/// entry of `columns`, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummarySpec {
    pub table_name: String,
    pub columns: Vec<SummaryColumn>,
    pub query: QuerySpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryColumn {
    pub name: String,
    pub data_type: Option<String>,
}

impl QueryConstructor {
    /// Build the summary statement for a table known to the schema index.
    ///
    /// The name is checked against the identifier rule before the index is
    /// consulted, since it ends up interpolated.
    pub fn summarize_table(
        &self,
        table_name: &str,
        index: &SchemaIndex,
    ) -> Result<TableSummarySpec, QueryError> {
        validate_identifier(table_name.trim())?;
        let table = index.describe(table_name)?;
        let quoted_table = quote_identifier(&table.name)?;

        let mut columns = Vec::new();
        let mut aggregates = vec!["COUNT(*) AS \"row_count\"".to_string()];
        for column in table.queryable_columns() {
            if columns.len() == MAX_SUMMARY_COLUMNS {
                break;
            }
            let Ok(quoted) = quote_identifier(&column.name) else {
                tracing::debug!(column = %column.name, "Skipping column with unsafe name");
                continue;
            };
            aggregates.push(format!(
                "COUNT(*) - COUNT({}) AS \"null_{}\"",
                quoted,
                columns.len() + 1
            ));
            columns.push(SummaryColumn {
                name: column.name.clone(),
                data_type: column.data_type.clone(),
            });
        }

        let sql = format!("SELECT {} FROM {}", aggregates.join(", "), quoted_table);
        Ok(TableSummarySpec {
            table_name: table.name.clone(),
            columns,
            query: QuerySpec::canned(
                sql,
                1,
                CannedIntent::new(IntentKind::TableSummary, table.name.clone()),
            ),
        })
    }
}

/// Null percentage rounded to one decimal place; zero for an empty table.
pub fn null_percentage(null_count: u64, row_count: u64) -> f64 {
    if row_count == 0 {
        return 0.0;
    }
    (null_count as f64 / row_count as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdw_core::LimitsConfig;
    use cdw_policy::{QueryValidator, ValidationErrorKind};
    use cdw_schema::{ColumnDescriptor, TableDescriptor};

    fn index() -> SchemaIndex {
        let mut table = TableDescriptor::new("EncounterFact");
        let mut derived = ColumnDescriptor::new("DateKeyValue", "date");
        derived.queryable = false;
        table.columns = vec![
            ColumnDescriptor::new("EncounterKey", "bigint"),
            derived,
            ColumnDescriptor::new("DateKey", "int"),
        ];

        let mut wide = TableDescriptor::new("WideDim");
        wide.columns = (0..80)
            .map(|i| ColumnDescriptor::new(format!("Col{i}"), "int"))
            .collect();
        SchemaIndex::from_tables([table, wide])
    }

    fn constructor() -> QueryConstructor {
        QueryConstructor::new(LimitsConfig::default())
    }

    #[test]
    fn test_summary_statement() {
        let spec = constructor()
            .summarize_table("encounterfact", &index())
            .unwrap();
        assert_eq!(spec.table_name, "EncounterFact");
        assert_eq!(
            spec.query.sql,
            "SELECT COUNT(*) AS \"row_count\", \
             COUNT(*) - COUNT(\"EncounterKey\") AS \"null_1\", \
             COUNT(*) - COUNT(\"DateKey\") AS \"null_2\" \
             FROM \"EncounterFact\""
        );
        let names: Vec<_> = spec.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["EncounterKey", "DateKey"]);
        assert!(QueryValidator::new().is_read_only(&spec.query.sql));
    }

    #[test]
    fn test_summary_caps_columns() {
        let spec = constructor().summarize_table("WideDim", &index()).unwrap();
        assert_eq!(spec.columns.len(), MAX_SUMMARY_COLUMNS);
    }

    #[test]
    fn test_summary_rejects_unsafe_name_before_lookup() {
        let err = constructor()
            .summarize_table("EncounterFact; DROP TABLE x", &index())
            .unwrap_err();
        match err {
            QueryError::Rejected(e) => assert_eq!(e.kind, ValidationErrorKind::UnsafeIdentifier),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_summary_unknown_table() {
        let err = constructor()
            .summarize_table("NoSuchTable", &index())
            .unwrap_err();
        assert!(matches!(err, QueryError::Schema(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_null_percentage() {
        assert_eq!(null_percentage(0, 0), 0.0);
        assert_eq!(null_percentage(1, 3), 33.3);
        assert_eq!(null_percentage(5, 10), 50.0);
    }
}
