//! The statement execution capability the migration engine runs against

use serde::Serialize;

use crate::error::Result;

/// Executes SQL against some database.
///
/// This is the only surface the engine needs from a backend: run a statement
/// for its side effects, or run a query and read back rows by column name.
pub trait DatabaseHandle {
    /// Execute a statement, failing with [`crate::Error::Execution`].
    fn execute(&self, sql: &str) -> Result<()>;

    /// Run a query and return all rows, failing with [`crate::Error::Query`].
    fn query(&self, sql: &str) -> Result<Vec<Row>>;
}

impl<T: DatabaseHandle + ?Sized> DatabaseHandle for Box<T> {
    fn execute(&self, sql: &str) -> Result<()> {
        (**self).execute(sql)
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        (**self).query(sql)
    }
}

/// One result row. Values are kept in their text form; `NULL` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    values: Vec<(String, Option<String>)>,
}

impl Row {
    pub fn new(values: Vec<(String, Option<String>)>) -> Self {
        Row { values }
    }

    /// Build a row of non-null values.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Row {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
        }
    }

    /// Value of a column, matched case-insensitively.
    ///
    /// Returns `None` both for a missing column and for `NULL`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
