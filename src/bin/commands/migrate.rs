use anyhow::Result;
use clap::Args;
use strata::{OutputFormat, StrataConfig};

use super::{open_migrator, print_plan, print_versions};

/// Arguments for the Migrate command
#[derive(Args)]
pub struct MigrateArgs {
    /// Print the SQL that would run without changing the schema
    #[clap(long)]
    pub dry_run: bool,
}

pub fn run(config: &StrataConfig, args: MigrateArgs, output_format: OutputFormat) -> Result<()> {
    let mut migrator = open_migrator(config, args.dry_run)?;

    if args.dry_run {
        return print_plan(&migrator.plan_apply()?, output_format);
    }

    let applied = migrator.apply()?;
    print_versions(&migrator, &applied, "applied", output_format)
}
