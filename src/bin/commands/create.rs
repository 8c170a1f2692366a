use anyhow::Result;
use clap::Args;
use serde_json::json;
use strata::{create_migration_file, OutputFormat, StrataConfig};

/// Arguments for the Create command
#[derive(Args)]
pub struct CreateArgs {
    /// Migration name, e.g. CreateLoginAttemptTable
    pub name: String,
}

pub fn run(config: &StrataConfig, args: CreateArgs, output_format: OutputFormat) -> Result<()> {
    let now = chrono::Local::now().naive_local();
    let path = create_migration_file(&config.migrations_dir(), &args.name, now)?;

    if output_format.is_json() {
        println!("{}", json!({ "created": path.to_string_lossy() }));
    } else {
        println!("Created {}", path.display());
    }
    Ok(())
}
