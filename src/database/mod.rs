//! Database module
//!
//! Everything strata knows about the target database goes through
//! [`DatabaseHandle`]: execute a statement, or run a query and get rows back.
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── handle      # DatabaseHandle trait + Row
//! │   ├── connection  # SQLite DatabaseConn (rusqlite)
//! │   └── recording   # RecordingHandle for dry runs and tests
//! │
//! └── history         # Bookkeeping table (applied versions)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use strata::database::{connect, DatabaseHandle};
//!
//! let handle = connect("sqlite3", "app.sqlite3")?;
//! handle.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)")?;
//! let rows = handle.query("SELECT id FROM t")?;
//! ```
//!
//! Only SQLite ships with a built-in backend. MySQL and PostgreSQL databases are
//! reached by implementing [`DatabaseHandle`] over the driver of your choice and
//! handing it to [`crate::Migrator::new`]. [`connect_or_record`] stands in a
//! [`RecordingHandle`] for them so their SQL can still be previewed.

pub mod core;
mod history;

pub use self::core::{DatabaseConn, DatabaseHandle, RecordingHandle, Row};
pub use history::{ExecutedRecord, MigrationHistory, DEFAULT_MIGRATION_TABLE};

use tracing::warn;

use crate::error::{Error, Result};
use crate::platform::DialectName;

/// Open a connection for a database type using a built-in backend.
///
/// `database` is the SQLite file path (`:memory:` for an in-memory database).
pub fn connect(db_type: &str, database: &str) -> Result<Box<dyn DatabaseHandle>> {
    match db_type.parse::<DialectName>()? {
        DialectName::Sqlite => {
            let conn = if database == ":memory:" {
                DatabaseConn::open_in_memory()?
            } else {
                ensure_parent_dir(database)?;
                DatabaseConn::open_path(database)?
            };
            Ok(Box::new(conn))
        }
        other => Err(Error::BackendUnavailable(other.to_string())),
    }
}

/// Like [`connect`], but a dialect without a built-in backend gets an empty
/// [`RecordingHandle`] instead of an error.
///
/// Statements sent to the recorder are discarded and every query returns no
/// rows, so only dry runs give meaningful results.
pub fn connect_or_record(db_type: &str, database: &str) -> Result<Box<dyn DatabaseHandle>> {
    match connect(db_type, database) {
        Err(Error::BackendUnavailable(dialect)) => {
            warn!(db_type = %dialect, "no built-in backend, using an empty recording database");
            Ok(Box::new(RecordingHandle::new()))
        }
        other => other,
    }
}

/// Ensure the directory holding a database file exists
fn ensure_parent_dir(path: &str) -> Result<()> {
    match std::path::Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(std::fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}
