//! Bookkeeping table access
//!
//! The bookkeeping table records one row per applied migration version. Its
//! unique constraint on `version` is the only guard against applying the same
//! migration twice.

use serde::Serialize;
use tracing::debug;

use super::DatabaseHandle;
use crate::error::Result;
use crate::platform::{quote_literal, Platform};
use crate::version::Version;

/// Default bookkeeping table name.
pub const DEFAULT_MIGRATION_TABLE: &str = "schema_migrations";

/// A bookkeeping row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutedRecord {
    pub version: Version,
    pub executed_at: Option<String>,
}

/// Reads and writes the bookkeeping table through a [`DatabaseHandle`].
pub struct MigrationHistory<'a> {
    handle: &'a dyn DatabaseHandle,
    table_name: &'a str,
}

impl<'a> MigrationHistory<'a> {
    pub fn new(handle: &'a dyn DatabaseHandle, table_name: &'a str) -> Self {
        MigrationHistory { handle, table_name }
    }

    pub fn table_name(&self) -> &str {
        self.table_name
    }

    /// Create the bookkeeping table if it does not exist.
    pub fn ensure_table(&self, platform: &dyn Platform) -> Result<()> {
        let sql = platform.migration_table_sql(self.table_name);
        debug!(table = self.table_name, "ensuring bookkeeping table");
        self.handle.execute(&sql)
    }

    /// Executed versions, ascending.
    pub fn executed_versions(&self) -> Result<Vec<Version>> {
        Ok(self
            .executed_records()?
            .into_iter()
            .map(|r| r.version)
            .collect())
    }

    /// Executed rows, ascending by version.
    pub fn executed_records(&self) -> Result<Vec<ExecutedRecord>> {
        let sql = format!(
            "SELECT version, executed_at FROM {} ORDER BY version ASC",
            self.table_name
        );
        let rows = self.handle.query(&sql)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            // rows without a version cannot be matched to any migration
            let Some(version) = row.get("version") else {
                continue;
            };
            records.push(ExecutedRecord {
                version: Version::parse(version)?,
                executed_at: row.get("executed_at").map(str::to_string),
            });
        }
        // the database collation may not order digit strings bytewise
        records.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(records)
    }

    /// Record a version as executed. A second insert of the same version fails
    /// with the database's uniqueness violation.
    pub fn mark_executed(&self, version: &Version) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (version) VALUES ({})",
            self.table_name,
            quote_literal(version.as_str())
        );
        self.handle.execute(&sql)
    }

    /// Remove the record of a version.
    pub fn mark_reverted(&self, version: &Version) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE version = {}",
            self.table_name,
            quote_literal(version.as_str())
        );
        self.handle.execute(&sql)
    }
}
