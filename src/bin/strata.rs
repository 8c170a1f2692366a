use clap::{Args, Parser, Subcommand};
use strata::{OutputFormat, StrataConfig};
use tracing::Level;

mod commands;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default ./strata.toml is used when present
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// Print debug information, including every SQL statement executed
    #[clap(long, global = true)]
    debug: bool,

    /// Output format: table (default), markdown, json, json-pretty, json-line, psv
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(flatten)]
    overrides: ConfigOverrides,

    #[clap(subcommand)]
    command: Commands,
}

/// Command-line values that take precedence over the configuration file
#[derive(Args)]
struct ConfigOverrides {
    /// Database type: mysqli, pgsql or sqlite3 (mysqli and pgsql only support --dry-run)
    #[clap(long, global = true)]
    db_type: Option<String>,

    /// Database to migrate (a file path for sqlite3)
    #[clap(long, global = true)]
    database: Option<String>,

    /// Directory holding Version<digits>_<Name>.sql migrations
    #[clap(long, global = true)]
    path: Option<String>,
}

impl ConfigOverrides {
    fn apply(self, mut config: StrataConfig) -> StrataConfig {
        if let Some(db_type) = self.db_type {
            config.db_type = db_type;
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        if let Some(path) = self.path {
            config.migrations_path = path;
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, empty SQL migration file
    Create(commands::create::CreateArgs),

    /// Apply all pending migrations
    Migrate(commands::migrate::MigrateArgs),

    /// Revert the most recently applied migrations
    Rollback(commands::rollback::RollbackArgs),

    /// Show which migrations have been applied
    Status,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            // filter spans/events with level DEBUG or higher.
            .with_max_level(Level::DEBUG)
            .init();
    }

    let config = match StrataConfig::new(&cli.config) {
        Ok(c) => cli.overrides.apply(c),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let output_format = cli.format;
    let result = match cli.command {
        Commands::Create(args) => commands::create::run(&config, args, output_format),
        Commands::Migrate(args) => commands::migrate::run(&config, args, output_format),
        Commands::Rollback(args) => commands::rollback::run(&config, args, output_format),
        Commands::Status => commands::status::run(&config, output_format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
