//! Result sets and their delimited-text rendering.

use crate::connector::RowSink;
use crate::error::GatewayError;
use std::io::Write;

/// One result row; `None` is SQL NULL.
pub type Row = Vec<Option<String>>;

/// Text returned for statements that produce no result columns.
pub const NO_RESULTS_MESSAGE: &str = "Query executed successfully (no results returned)";

/// Export text for a statement with no result columns.
pub const NO_EXPORT_MESSAGE: &str = "Query returned no results. No file created.";

/// An in-memory, bounded result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the statement produced no result columns at all.
    pub fn has_no_columns(&self) -> bool {
        self.columns.is_empty()
    }

    /// Cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// Header then rows, RFC 4180 quoting, NULL as an empty field.
    pub fn to_csv(&self) -> Result<String, GatewayError> {
        let mut writer = csv_writer(Vec::new());
        write_header(&mut writer, &self.columns)?;
        for row in &self.rows {
            write_row(&mut writer, row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| GatewayError::execution(format!("failed to render CSV: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| GatewayError::execution(format!("failed to render CSV: {}", e)))?;
        Ok(text.trim_end_matches('\n').to_string())
    }

    /// Text for the caller: CSV, or [`NO_RESULTS_MESSAGE`].
    pub fn render(&self) -> Result<String, GatewayError> {
        if self.has_no_columns() {
            Ok(NO_RESULTS_MESSAGE.to_string())
        } else {
            self.to_csv()
        }
    }
}

impl RowSink for ResultSet {
    fn columns(&mut self, columns: &[String]) -> Result<(), GatewayError> {
        self.columns = columns.to_vec();
        Ok(())
    }

    fn rows(&mut self, mut rows: Vec<Row>) -> Result<(), GatewayError> {
        self.rows.append(&mut rows);
        Ok(())
    }
}

/// Streams a result set to a CSV file as batches arrive.
pub struct CsvFileSink<W: Write> {
    writer: csv::Writer<W>,
    rows_written: u64,
    has_header: bool,
}

impl<W: Write> CsvFileSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv_writer(inner),
            rows_written: 0,
            has_header: false,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Whether the statement produced result columns.
    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Flush buffered output.
    pub fn finish(mut self) -> Result<u64, GatewayError> {
        self.writer
            .flush()
            .map_err(|e| GatewayError::execution(format!("failed to flush export: {}", e)))?;
        Ok(self.rows_written)
    }
}

impl<W: Write> RowSink for CsvFileSink<W> {
    fn columns(&mut self, columns: &[String]) -> Result<(), GatewayError> {
        if columns.is_empty() {
            return Ok(());
        }
        write_header(&mut self.writer, columns)?;
        self.has_header = true;
        Ok(())
    }

    fn rows(&mut self, rows: Vec<Row>) -> Result<(), GatewayError> {
        for row in &rows {
            write_row(&mut self.writer, row)?;
        }
        self.rows_written += rows.len() as u64;
        Ok(())
    }
}

fn csv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(inner)
}

fn write_header<W: Write>(writer: &mut csv::Writer<W>, columns: &[String]) -> Result<(), GatewayError> {
    writer
        .write_record(columns)
        .map_err(|e| GatewayError::execution(format!("failed to write CSV header: {}", e)))
}

fn write_row<W: Write>(writer: &mut csv::Writer<W>, row: &Row) -> Result<(), GatewayError> {
    writer
        .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
        .map_err(|e| GatewayError::execution(format!("failed to write CSV row: {}", e)))
}
