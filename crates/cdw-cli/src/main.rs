use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::schema::SchemaCommand;
use commands::serve::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "cdw", version, about = "Clinical data warehouse MCP server")]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true, default_value = "cdw.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the MCP server.
    Serve(ServeArgs),

    /// Build or inspect the schema reference document.
    Schema {
        #[command(subcommand)]
        cmd: SchemaCommand,
    },

    /// Check whether a statement passes the read-only policy.
    CheckSql {
        /// SQL text, or `-` to read it from stdin.
        sql: String,
    },

    /// List the tools the server registers.
    Tools {
        /// Show each tool's input schema.
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(&cli.config)?;

    // stdout carries the stdio transport, so logs go to stderr.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !cli.config.exists() {
        tracing::warn!(config = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.cmd {
        Command::Serve(args) => commands::serve::execute(config, args).await?,
        Command::Schema { cmd } => commands::schema::execute(&config, cmd)?,
        Command::CheckSql { sql } => commands::check::execute(&sql)?,
        Command::Tools { verbose } => commands::tools::list(&config, verbose)?,
    }

    Ok(())
}
