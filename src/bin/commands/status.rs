use anyhow::Result;
use serde::Serialize;
use strata::output::{render, to_json};
use strata::{MigrationStatus, OutputFormat, StrataConfig};
use tabled::Tabled;

use super::open_migrator;

#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    version: String,
    status: String,
    executed_at: String,
    name: String,
}

impl From<MigrationStatus> for StatusRow {
    fn from(s: MigrationStatus) -> Self {
        StatusRow {
            version: s.version.to_string(),
            status: if s.executed { "applied" } else { "pending" }.to_string(),
            executed_at: s.executed_at.unwrap_or_default(),
            name: s.name,
        }
    }
}

pub fn run(config: &StrataConfig, output_format: OutputFormat) -> Result<()> {
    let migrator = open_migrator(config, false)?;
    let statuses = migrator.status()?;

    // the library's typed fields (bool, null) go to JSON as-is
    if let Some(json) = to_json(&statuses, output_format)? {
        println!("{}", json);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No migrations found in {}", config.migrations_path);
        return Ok(());
    }

    let rows: Vec<StatusRow> = statuses.into_iter().map(StatusRow::from).collect();
    println!("{}", render(&rows, output_format)?);
    Ok(())
}
