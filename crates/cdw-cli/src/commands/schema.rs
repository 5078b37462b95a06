//! `cdw schema`: build the reference document from dictionary exports, or
//! query it the way the discovery tools do.

use anyhow::{Context, Result};
use cdw_core::CdwConfig;
use cdw_schema::{SchemaCatalog, SchemaDocument, SearchOutcome, read_dictionary};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Merge the `Tables` and `Columns` sheet exports into a reference document.
    Build {
        /// CSV export of the `Tables` sheet.
        #[arg(long)]
        tables: PathBuf,

        /// CSV export of the `Columns` sheet.
        #[arg(long)]
        columns: PathBuf,

        /// Output path. Defaults to the configured schema reference.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List every table with its flags and column count.
    Overview,

    /// Show one table in full.
    Describe {
        /// Table name (case-insensitive).
        table: String,
    },

    /// Search table and column names and descriptions.
    Search {
        /// Case-insensitive keyword.
        keyword: String,
    },
}

pub fn execute(config: &CdwConfig, cmd: SchemaCommand) -> Result<()> {
    match cmd {
        SchemaCommand::Build {
            tables,
            columns,
            out,
        } => {
            let out = out.unwrap_or_else(|| config.schema_reference.clone());
            let count = build(&tables, &columns, &out)?;
            println!("Wrote {} tables to {}", count, out.display());
        }
        SchemaCommand::Overview => {
            let catalog = catalog(config);
            print_json(&catalog.index()?.overview())?;
        }
        SchemaCommand::Describe { table } => {
            let catalog = catalog(config);
            print_json(catalog.index()?.describe(&table)?)?;
        }
        SchemaCommand::Search { keyword } => {
            let catalog = catalog(config);
            match catalog.index()?.search(&keyword)? {
                SearchOutcome::Matches(hits) => print_json(&hits)?,
                outcome @ SearchOutcome::NoMatches { .. } => {
                    println!("{}", outcome.no_matches_message().unwrap_or_default())
                }
            }
        }
    }
    Ok(())
}

/// Merge the two sheets and write the document. Returns the table count.
fn build(tables: &Path, columns: &Path, out: &Path) -> Result<usize> {
    let index = read_dictionary(tables, columns).context("Failed to read data dictionary")?;
    let document = SchemaDocument::from_index(&index);
    fs::write(out, document.to_json_pretty()?)
        .with_context(|| format!("Failed to write schema reference: {:?}", out))?;
    tracing::info!(tables = index.len(), path = %out.display(), "Schema reference written");
    Ok(index.len())
}

fn catalog(config: &CdwConfig) -> SchemaCatalog {
    SchemaCatalog::from_path(&config.schema_reference)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
