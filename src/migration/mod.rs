//! Migration units
//!
//! A migration is a reversible schema change: [`Migration::up`] applies it and
//! [`Migration::down`] reverts it. Both receive a [`MigrationContext`] bound to
//! the target database and the translator for its dialect, and describe their
//! work with the context's primitives:
//!
//! ```rust,ignore
//! struct CreateLoginAttemptTable;
//!
//! impl Migration for CreateLoginAttemptTable {
//!     fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
//!         ctx.create("dtb_login_attempt", |t| {
//!             t.serial();
//!             t.text("login_id").not_null();
//!             t.timestamp("create_date").not_null().default("CURRENT_TIMESTAMP");
//!             t.index(&["login_id", "create_date"], None);
//!         })
//!     }
//!
//!     fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
//!         ctx.drop("dtb_login_attempt")
//!     }
//! }
//! ```
//!
//! Units are found through a [`MigrationRegistry`] (explicit registration) and,
//! optionally, a directory of `.sql` files (see [`sql_file`]).

mod registry;
pub mod sql_file;

use tracing::debug;

use crate::database::DatabaseHandle;
use crate::error::Result;
use crate::platform::{DialectName, Platform};
use crate::schema::Table;

pub use registry::{AvailableMigration, MigrationFactory, MigrationRegistry};
pub use sql_file::{create_migration_file, discover_directory, split_statements, SqlFileMigration};

/// A reversible schema change.
pub trait Migration {
    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<()>;

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<()>;
}

/// A raw statement with optional per-dialect replacements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSql {
    default: String,
    overrides: Vec<(DialectName, String)>,
}

impl RawSql {
    pub fn new(default: impl Into<String>) -> Self {
        RawSql {
            default: default.into(),
            overrides: Vec::new(),
        }
    }

    /// Use `sql` instead of the default statement on `dialect`.
    pub fn with(mut self, dialect: DialectName, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        match self.overrides.iter_mut().find(|(d, _)| *d == dialect) {
            Some(slot) => slot.1 = sql,
            None => self.overrides.push((dialect, sql)),
        }
        self
    }

    /// The statement to run on `dialect`.
    pub fn for_dialect(&self, dialect: DialectName) -> &str {
        self.overrides
            .iter()
            .find(|(d, _)| *d == dialect)
            .map(|(_, sql)| sql.as_str())
            .unwrap_or(&self.default)
    }
}

impl From<&str> for RawSql {
    fn from(sql: &str) -> Self {
        RawSql::new(sql)
    }
}

impl From<String> for RawSql {
    fn from(sql: String) -> Self {
        RawSql::new(sql)
    }
}

/// The database and translator a migration runs against.
pub struct MigrationContext<'a> {
    handle: &'a dyn DatabaseHandle,
    platform: &'a mut dyn Platform,
}

impl<'a> MigrationContext<'a> {
    pub fn new(handle: &'a dyn DatabaseHandle, platform: &'a mut dyn Platform) -> Self {
        MigrationContext { handle, platform }
    }

    pub fn dialect(&self) -> DialectName {
        self.platform.dialect()
    }

    pub fn platform(&self) -> &dyn Platform {
        &*self.platform
    }

    pub fn handle(&self) -> &dyn DatabaseHandle {
        self.handle
    }

    /// Create a table: `CREATE TABLE`, its indexes, then its sequence and the
    /// serial default where the dialect needs them.
    pub fn create<F>(&mut self, table_name: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Table),
    {
        let mut table = Table::new(table_name);
        build(&mut table);

        let mut statements = vec![self.platform.create_table(&table)];
        statements.extend(self.platform.create_indexes(&table));
        statements.extend(self.platform.create_sequence(&table));
        statements.extend(self.platform.serial_default_sql(&table));

        for sql in &statements {
            self.execute(sql)?;
        }
        Ok(())
    }

    /// Alter an existing table, replaying the recorded operations in order.
    pub fn table<F>(&mut self, table_name: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut Table),
    {
        let mut table = Table::alter(table_name);
        build(&mut table);

        // every statement is built before the first one runs
        let statements = self.platform.alter_table(&table, self.handle)?;
        for sql in &statements {
            self.execute(sql)?;
        }
        Ok(())
    }

    /// Drop a table and its sequence, if the dialect keeps one.
    pub fn drop(&mut self, table_name: &str) -> Result<()> {
        let sql = self.platform.drop_table(table_name);
        self.execute(&sql)?;

        if let Some(sql) = self.platform.drop_sequence(table_name) {
            self.execute(&sql)?;
        }
        Ok(())
    }

    /// Run a raw statement, picking the override for the bound dialect if any.
    pub fn sql(&mut self, sql: impl Into<RawSql>) -> Result<()> {
        let raw = sql.into();
        let statement = raw.for_dialect(self.dialect()).to_string();
        self.execute(&statement)
    }

    pub fn execute(&mut self, sql: &str) -> Result<()> {
        debug!(dialect = %self.dialect(), sql, "executing");
        self.handle.execute(sql)
    }
}
