pub mod create;
pub mod migrate;
pub mod rollback;
pub mod status;

use anyhow::Result;
use serde::Serialize;
use strata::output::{render, to_json};
use strata::{
    connect, connect_or_record, DialectName, Migrator, OutputFormat, PlannedMigration, StrataConfig,
    Version,
};
use tabled::Tabled;

/// Open the configured database and build a migrator over it.
///
/// A dry run against a dialect without a built-in backend plans against an
/// empty database.
pub(crate) fn open_migrator(config: &StrataConfig, dry_run: bool) -> Result<Migrator> {
    let handle = if dry_run {
        if config.dialect()? != DialectName::Sqlite {
            eprintln!(
                "NOTE: no built-in {} backend, planning as if no migration has run",
                config.db_type
            );
        }
        connect_or_record(&config.db_type, &config.database)?
    } else {
        connect(&config.db_type, &config.database)?
    };
    let migrator = Migrator::new(handle, &config.db_type)?
        .with_migrations_path(config.migrations_dir())
        .with_table_name(&config.table_name);
    Ok(migrator)
}

#[derive(Debug, Serialize, Tabled)]
struct VersionRow {
    version: String,
    name: String,
}

/// Print versions that were applied or reverted.
pub(crate) fn print_versions(
    migrator: &Migrator,
    versions: &[Version],
    action: &str,
    output_format: OutputFormat,
) -> Result<()> {
    if versions.is_empty() && !output_format.is_json() {
        println!("No migrations {}.", action);
        return Ok(());
    }

    let available = migrator.available()?;
    let rows: Vec<VersionRow> = versions
        .iter()
        .map(|v| VersionRow {
            version: v.to_string(),
            name: available
                .iter()
                .find(|m| &m.version == v)
                .map(|m| m.name.clone())
                .unwrap_or_default(),
        })
        .collect();

    println!("{}", render(&rows, output_format)?);
    Ok(())
}

/// Print the SQL a dry run would execute.
pub(crate) fn print_plan(plan: &[PlannedMigration], output_format: OutputFormat) -> Result<()> {
    if let Some(json) = to_json(plan, output_format)? {
        println!("{}", json);
        return Ok(());
    }

    if plan.is_empty() {
        println!("-- nothing to do");
        return Ok(());
    }

    for migration in plan {
        println!("-- {}", migration.name);
        for statement in &migration.statements {
            println!("{};", statement.trim_end_matches(';'));
        }
        println!();
    }
    Ok(())
}
