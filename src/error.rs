//! Error types
//!
//! Every fallible library operation returns [`Result`]. Configuration problems
//! (unsupported dialect, malformed migration identifiers) are reported before any
//! SQL is issued; execution failures carry the statement that failed and the
//! backend error untouched as their `source`.

use thiserror::Error;

/// Boxed backend error, kept as-is so callers can inspect the original failure.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by strata.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured database type is not one of the supported dialects.
    #[error("unsupported database type: {0}")]
    UnsupportedDialect(String),

    /// An abstract column type name that no dialect knows about.
    #[error("unknown column type: {0}")]
    UnknownColumnType(String),

    /// A version string that is empty or contains non-digit characters.
    #[error("invalid migration version '{0}': versions are non-empty digit strings")]
    InvalidVersion(String),

    /// A migration identifier that does not follow `Version<digits>[_<name>]`.
    #[error("invalid migration identifier '{0}': expected Version<digits>[_<name>]")]
    InvalidMigrationId(String),

    /// Two migrations share the same version.
    #[error("duplicate migration version {version}: {first} and {second}")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },

    /// Versions of different digit widths would not order correctly as strings.
    #[error("migration {name} has a {width}-digit version, expected {expected} digits")]
    VersionWidthMismatch {
        name: String,
        width: usize,
        expected: usize,
    },

    /// A migration that does not satisfy the up/down contract.
    #[error("invalid migration {name}: {reason}")]
    InvalidMigration { name: String, reason: String },

    /// No built-in connection backend exists for this dialect.
    #[error("no connection backend available for database type {0}")]
    BackendUnavailable(String),

    /// A statement failed while executing.
    #[error("failed to execute SQL `{statement}`: {source}")]
    Execution {
        statement: String,
        #[source]
        source: BackendError,
    },

    /// A read query failed.
    #[error("failed to run query `{statement}`: {source}")]
    Query {
        statement: String,
        #[source]
        source: BackendError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Errors raised by user-authored migration code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn execution(statement: &str, source: impl Into<BackendError>) -> Self {
        Error::Execution {
            statement: statement.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn query(statement: &str, source: impl Into<BackendError>) -> Self {
        Error::Query {
            statement: statement.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn invalid_migration(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidMigration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
