//! `cdw check-sql`: run a statement through the read-only policy offline.

use anyhow::{Context, Result};
use cdw_policy::QueryValidator;
use std::io::Read;

pub fn execute(sql: &str) -> Result<()> {
    let sql = if sql == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read SQL from stdin")?;
        buffer
    } else {
        sql.to_string()
    };

    let verdict = check(&sql)?;
    println!("{}", verdict);
    Ok(())
}

fn check(sql: &str) -> Result<&'static str> {
    match QueryValidator::new().validate(sql) {
        Ok(()) => Ok("OK: statement is read-only"),
        Err(e) => anyhow::bail!("Rejected ({}): {}", e.kind, e.message),
    }
}
