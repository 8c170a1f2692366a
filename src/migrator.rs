//! Migration orchestration
//!
//! [`Migrator`] reconciles the migrations that exist (registered units plus an
//! optional directory of SQL files) with the versions recorded in the
//! bookkeeping table, and runs whatever is pending or asked to be reverted.
//!
//! Each unit runs without a surrounding transaction. Its bookkeeping row is
//! written only after the unit succeeds, and the first failure stops the run:
//! units applied before it stay applied and recorded.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::database::{
    connect, DatabaseHandle, ExecutedRecord, MigrationHistory, RecordingHandle, Row,
    DEFAULT_MIGRATION_TABLE,
};
use crate::error::Result;
use crate::migration::{
    discover_directory, AvailableMigration, Migration, MigrationContext, MigrationRegistry,
};
use crate::platform::{create_platform, platform_for, DialectName, Platform};
use crate::version::Version;

/// Whether an available migration has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: Version,
    pub executed: bool,
    pub name: String,
    pub executed_at: Option<String>,
}

/// SQL a migration would run, produced without touching the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMigration {
    pub version: Version,
    pub name: String,
    pub statements: Vec<String>,
}

/// Outcome of an unattended [`run_installer`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub success: bool,
    pub executed: Vec<Version>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Applies and reverts migrations against one database.
pub struct Migrator {
    handle: Box<dyn DatabaseHandle>,
    platform: Box<dyn Platform>,
    registry: MigrationRegistry,
    migrations_path: Option<PathBuf>,
    table_name: String,
}

impl Migrator {
    /// Create a migrator for a database of type `db_type` (`mysql`, `pgsql`,
    /// `sqlite3`, ...). An unsupported type fails before any SQL is issued.
    pub fn new(handle: Box<dyn DatabaseHandle>, db_type: &str) -> Result<Self> {
        let platform = platform_for(db_type)?;
        Ok(Migrator {
            handle,
            platform,
            registry: MigrationRegistry::new(),
            migrations_path: None,
            table_name: DEFAULT_MIGRATION_TABLE.to_string(),
        })
    }

    /// Use these registered migrations.
    pub fn with_registry(mut self, registry: MigrationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Also load `Version*.sql` migrations from this directory on every run.
    pub fn with_migrations_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.migrations_path = Some(path.into());
        self
    }

    /// Name of the bookkeeping table (default `schema_migrations`).
    pub fn with_table_name(mut self, table_name: &str) -> Self {
        self.table_name = table_name.to_string();
        self
    }

    pub fn dialect(&self) -> DialectName {
        self.platform.dialect()
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn handle(&self) -> &dyn DatabaseHandle {
        self.handle.as_ref()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn migrations_path(&self) -> Option<&Path> {
        self.migrations_path.as_deref()
    }

    /// All known migrations: the registry merged with a fresh directory scan.
    pub fn discover(&self) -> Result<MigrationRegistry> {
        let mut registry = self.registry.clone();
        if let Some(path) = &self.migrations_path {
            registry.merge(discover_directory(path)?)?;
        }
        Ok(registry)
    }

    /// Available migrations, ascending by version.
    pub fn available(&self) -> Result<Vec<AvailableMigration>> {
        Ok(self.discover()?.available())
    }

    /// Bookkeeping rows, ascending by version.
    pub fn executed(&self) -> Result<Vec<ExecutedRecord>> {
        let history = MigrationHistory::new(self.handle.as_ref(), &self.table_name);
        history.ensure_table(self.platform.as_ref())?;
        history.executed_records()
    }

    /// Apply every pending migration in ascending version order.
    ///
    /// Returns the versions applied, in order.
    pub fn apply(&mut self) -> Result<Vec<Version>> {
        let mut applied = Vec::new();
        self.apply_into(&mut applied)?;
        Ok(applied)
    }

    /// Apply pending migrations, pushing each version once it is recorded.
    ///
    /// On error `applied` still holds the versions that completed.
    fn apply_into(&mut self, applied: &mut Vec<Version>) -> Result<()> {
        let registry = self.discover()?;
        let handle = self.handle.as_ref();
        let platform = self.platform.as_mut();
        let history = MigrationHistory::new(handle, &self.table_name);

        history.ensure_table(&*platform)?;
        let pending = pending_versions(&registry, &history.executed_versions()?);

        applied.reserve(pending.len());
        for version in pending {
            let Some(migration) = registry.instantiate(&version) else {
                continue;
            };
            run_unit(migration.as_ref(), Direction::Up, handle, &mut *platform)?;
            history.mark_executed(&version)?;

            info!(
                version = %version,
                name = %registry.name_of(&version).unwrap_or_default(),
                "applied migration"
            );
            applied.push(version);
        }
        Ok(())
    }

    /// Revert the `steps` most recently applied migrations, newest first.
    ///
    /// A recorded version whose migration no longer exists is skipped with a
    /// warning and stays recorded; it still counts towards `steps`.
    pub fn revert(&mut self, steps: usize) -> Result<Vec<Version>> {
        let registry = self.discover()?;
        let handle = self.handle.as_ref();
        let platform = self.platform.as_mut();
        let history = MigrationHistory::new(handle, &self.table_name);

        history.ensure_table(&*platform)?;
        let executed = history.executed_versions()?;

        let mut reverted = Vec::new();
        for version in executed.into_iter().rev().take(steps) {
            let Some(migration) = registry.instantiate(&version) else {
                warn!(version = %version, "no migration available for executed version, skipping");
                continue;
            };
            run_unit(migration.as_ref(), Direction::Down, handle, &mut *platform)?;
            history.mark_reverted(&version)?;

            info!(
                version = %version,
                name = %registry.name_of(&version).unwrap_or_default(),
                "reverted migration"
            );
            reverted.push(version);
        }
        Ok(reverted)
    }

    /// Applied state of every available migration.
    pub fn status(&self) -> Result<Vec<MigrationStatus>> {
        let executed: HashMap<Version, Option<String>> = self
            .executed()?
            .into_iter()
            .map(|r| (r.version, r.executed_at))
            .collect();

        Ok(self
            .available()?
            .into_iter()
            .map(|m| {
                let executed_at = executed.get(&m.version).cloned();
                MigrationStatus {
                    executed: executed_at.is_some(),
                    executed_at: executed_at.flatten(),
                    version: m.version,
                    name: m.name,
                }
            })
            .collect())
    }

    /// The SQL [`Migrator::apply`] would run, without running it.
    ///
    /// Reads the bookkeeping table (creating it if missing) and lets dialects
    /// introspect existing tables; nothing else is executed.
    pub fn plan_apply(&self) -> Result<Vec<PlannedMigration>> {
        let registry = self.discover()?;
        let executed = self.executed()?;
        let executed: Vec<Version> = executed.into_iter().map(|r| r.version).collect();
        let pending = pending_versions(&registry, &executed);
        self.plan(&registry, pending, Direction::Up)
    }

    /// The SQL [`Migrator::revert`] would run, without running it.
    pub fn plan_revert(&self, steps: usize) -> Result<Vec<PlannedMigration>> {
        let registry = self.discover()?;
        let targets: Vec<Version> = self
            .executed()?
            .into_iter()
            .rev()
            .take(steps)
            .map(|r| r.version)
            .filter(|v| registry.contains(v))
            .collect();
        self.plan(&registry, targets, Direction::Down)
    }

    fn plan(
        &self,
        registry: &MigrationRegistry,
        versions: Vec<Version>,
        direction: Direction,
    ) -> Result<Vec<PlannedMigration>> {
        let preview = PreviewHandle {
            inner: self.handle.as_ref(),
            recorder: RecordingHandle::new(),
        };
        let mut platform = create_platform(self.dialect());

        let mut planned = Vec::with_capacity(versions.len());
        for version in versions {
            let Some(migration) = registry.instantiate(&version) else {
                continue;
            };
            run_unit(migration.as_ref(), direction, &preview, platform.as_mut())?;
            planned.push(PlannedMigration {
                name: registry.name_of(&version).unwrap_or_default(),
                version,
                statements: preview.recorder.take_statements(),
            });
        }
        Ok(planned)
    }
}

/// Versions in `registry` that are not in `executed`, ascending.
fn pending_versions(registry: &MigrationRegistry, executed: &[Version]) -> Vec<Version> {
    let executed: HashSet<&Version> = executed.iter().collect();
    registry
        .versions()
        .filter(|v| !executed.contains(v))
        .cloned()
        .collect()
}

fn run_unit(
    migration: &dyn Migration,
    direction: Direction,
    handle: &dyn DatabaseHandle,
    platform: &mut dyn Platform,
) -> Result<()> {
    // introspection results never outlive a single unit
    platform.clear_introspection_cache();
    let mut ctx = MigrationContext::new(handle, platform);
    match direction {
        Direction::Up => migration.up(&mut ctx),
        Direction::Down => migration.down(&mut ctx),
    }
}

/// Records statements while answering queries from the real database.
struct PreviewHandle<'a> {
    inner: &'a dyn DatabaseHandle,
    recorder: RecordingHandle,
}

impl DatabaseHandle for PreviewHandle<'_> {
    fn execute(&self, sql: &str) -> Result<()> {
        self.recorder.execute(sql)
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        self.inner.query(sql)
    }
}

/// Apply all pending migrations from `migrations_path` to a database opened with
/// a built-in backend, reporting the outcome instead of failing.
///
/// Meant for unattended installs: running it again reports
/// `0 migration(s) executed`. A failed run still lists the migrations that
/// were applied before the failure.
pub fn run_installer(db_type: &str, database: &str, migrations_path: &Path) -> InstallReport {
    let mut executed = Vec::new();
    let result = connect(db_type, database)
        .and_then(|handle| Migrator::new(handle, db_type))
        .and_then(|migrator| {
            migrator
                .with_migrations_path(migrations_path)
                .apply_into(&mut executed)
        });

    match result {
        Ok(()) => InstallReport {
            success: true,
            message: format!("{} migration(s) executed", executed.len()),
            executed,
        },
        Err(e) => {
            error!(error = %e, executed = executed.len(), "installer migration run failed");
            InstallReport {
                success: false,
                executed,
                message: e.to_string(),
            }
        }
    }
}
