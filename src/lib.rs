#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Strata - versioned schema migrations for MySQL, PostgreSQL and SQLite
//!
//! Strata applies and reverts versioned, reversible schema migrations and keeps
//! a record of which ones have run in a bookkeeping table. Migrations describe
//! tables with a dialect-neutral schema model; a per-dialect translator turns
//! that model into SQL. It can be used as both a command-line application and a
//! library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Library: schema model, translators, orchestrator, SQLite backend | `rusqlite` |
//! | `display` | Table and JSON rendering of command output | `tabled`, `serde_json` |
//! | `cli` | The `strata` binary | All above + `clap`, `dotenvy`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! strata = { version = "0.1", default-features = false }
//!
//! # Default (CLI binary)
//! strata = "0.1"
//! ```
//!
//! # Architecture
//!
//! - **[`schema`]**: dialect-neutral [`Table`] and [`Column`] descriptions
//! - **[`platform`]**: the [`Platform`] translators for MySQL, PostgreSQL and SQLite
//! - **[`database`]**: the [`DatabaseHandle`] seam, the SQLite backend and the
//!   bookkeeping table
//! - **[`migration`]**: the [`Migration`] trait, its [`MigrationContext`], the
//!   registry and `.sql` file migrations
//! - **[`migrator`]**: the [`Migrator`] orchestrator and [`run_installer`]
//! - **[`config`]**: configuration management
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use strata::{DatabaseConn, Migration, MigrationContext, MigrationRegistry, Migrator, Result};
//!
//! struct CreateCustomerTable;
//!
//! impl Migration for CreateCustomerTable {
//!     fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
//!         ctx.create("dtb_customer", |t| {
//!             t.serial();
//!             t.text("name").not_null();
//!             t.index(&["name"], None);
//!         })
//!     }
//!
//!     fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
//!         ctx.drop("dtb_customer")
//!     }
//! }
//!
//! let registry = MigrationRegistry::new()
//!     .with("Version20240101000001_CreateCustomerTable", || CreateCustomerTable)?;
//!
//! let db = DatabaseConn::open_path("app.sqlite3")?;
//! let mut migrator = Migrator::new(Box::new(db), "sqlite3")?.with_registry(registry);
//!
//! for version in migrator.apply()? {
//!     println!("applied {}", version);
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod migration;
pub mod migrator;
pub mod output;
pub mod platform;
pub mod schema;
pub mod version;

// =============================================================================
// Errors and configuration
// =============================================================================

pub use config::StrataConfig;
pub use error::{Error, Result};
pub use output::OutputFormat;

// =============================================================================
// Schema model and translators
// =============================================================================

pub use platform::{create_platform, platform_for, DialectName, Platform};
pub use schema::{Column, ColumnOptions, ColumnType, DefaultValue, Index, Table};

// =============================================================================
// Database access
// =============================================================================

pub use database::{
    connect, connect_or_record, DatabaseConn, DatabaseHandle, ExecutedRecord, MigrationHistory,
    RecordingHandle, Row, DEFAULT_MIGRATION_TABLE,
};

// =============================================================================
// Migrations and orchestration
// =============================================================================

pub use migration::{
    create_migration_file, discover_directory, AvailableMigration, Migration, MigrationContext,
    MigrationRegistry, RawSql, SqlFileMigration,
};
pub use migrator::{run_installer, InstallReport, MigrationStatus, Migrator, PlannedMigration};
pub use version::{MigrationId, Version};
