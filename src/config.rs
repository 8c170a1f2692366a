use anyhow::{anyhow, Result};
use config::{Config, Environment};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::database::DEFAULT_MIGRATION_TABLE;
use crate::platform::DialectName;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "strata.toml";

const ENV_PREFIX: &str = "STRATA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrataConfig {
    /// Database type, any accepted dialect name (`mysqli`, `pgsql`, `sqlite3`, ...)
    pub db_type: String,

    /// Database to open; a file path for SQLite
    pub database: String,

    /// Directory holding `Version*.sql` migrations
    pub migrations_path: String,

    /// Bookkeeping table name
    pub table_name: String,
}

const EMPTY_CONFIG: &str = r#"### strata configuration file

### database type: mysqli, pgsql or sqlite3
# db_type = "sqlite3"

### database to migrate (a file path for sqlite3)
# database = "strata.sqlite3"

### directory holding Version<digits>_<Name>.sql migrations
# migrations_path = "data/migrations"

### table recording executed migrations
# table_name = "schema_migrations"
"#;

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            db_type: DialectName::Sqlite.as_str().to_string(),
            database: "strata.sqlite3".to_string(),
            migrations_path: "data/migrations".to_string(),
            table_name: DEFAULT_MIGRATION_TABLE.to_string(),
        }
    }
}

impl StrataConfig {
    /// Load configuration from a TOML file layered with `STRATA_*` environment
    /// variables.
    ///
    /// An explicit `path` that does not exist gets a commented template written
    /// to it. Without a path, `./strata.toml` is read when present.
    pub fn new(path: &Option<String>) -> Result<StrataConfig> {
        Self::load(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load(path: &Option<String>, environment: Environment) -> Result<StrataConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    builder = builder.add_source(config::File::from(path));
                } else {
                    if let Some(parent) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| anyhow!("Unable to create config directory: {}", e))?;
                    }
                    std::fs::write(path, EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file {}: {}", p, e))?;
                }
            }
            None => {
                let p = Path::new(DEFAULT_CONFIG_FILE);
                if p.exists() {
                    builder = builder.add_source(config::File::from(p));
                }
            }
        }

        // E.g., `STRATA_DB_TYPE=pgsql strata status`
        builder = builder.add_source(environment);

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let defaults = StrataConfig::default();
        let get = |key: &str, default: String| -> String {
            config
                .get(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
        };

        let db_type = get("db_type", defaults.db_type);
        db_type
            .parse::<DialectName>()
            .map_err(|e| anyhow!("Invalid db_type in configuration: {}", e))?;

        Ok(StrataConfig {
            db_type,
            database: expand_home(&get("database", defaults.database)),
            migrations_path: expand_home(&get("migrations_path", defaults.migrations_path)),
            table_name: get("table_name", defaults.table_name),
        })
    }

    pub fn dialect(&self) -> Result<DialectName> {
        self.db_type
            .parse()
            .map_err(|e| anyhow!("Invalid db_type: {}", e))
    }

    pub fn migrations_dir(&self) -> PathBuf {
        PathBuf::from(&self.migrations_path)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!("Database Type:      {}", self.db_type),
            format!("Database:           {}", self.database),
            format!("Migrations Path:    {}", self.migrations_path),
            format!("Migration Table:    {}", self.table_name),
        ]
        .join("\n")
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).to_string_lossy().to_string(),
        _ => path.to_string(),
    }
}
