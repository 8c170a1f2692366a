use anyhow::{anyhow, Result};
use clap::Args;
use strata::{OutputFormat, StrataConfig};

use super::{open_migrator, print_plan, print_versions};

/// Arguments for the Rollback command
#[derive(Args)]
pub struct RollbackArgs {
    /// Number of migrations to revert, newest first
    #[clap(short, long, default_value_t = 1)]
    pub steps: usize,

    /// Print the SQL that would run without changing the schema
    #[clap(long)]
    pub dry_run: bool,
}

pub fn run(config: &StrataConfig, args: RollbackArgs, output_format: OutputFormat) -> Result<()> {
    let RollbackArgs { steps, dry_run } = args;
    if steps == 0 {
        return Err(anyhow!("--steps must be at least 1"));
    }

    let mut migrator = open_migrator(config, dry_run)?;

    if dry_run {
        return print_plan(&migrator.plan_revert(steps)?, output_format);
    }

    let reverted = migrator.revert(steps)?;
    print_versions(&migrator, &reverted, "reverted", output_format)
}
