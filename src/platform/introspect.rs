//! Column type introspection for existing tables
//!
//! Only the MySQL translator needs this: it must know whether an already
//! existing column is a `TEXT`/`BLOB` before it can index it. Lookups are cached
//! per table name; the owner clears entries when a table changes shape.

use std::collections::HashMap;

use tracing::debug;

use super::quote_literal;
use crate::database::DatabaseHandle;
use crate::error::Result;

/// MySQL `DATA_TYPE` values that need a key prefix when indexed.
const LONG_TEXT_TYPES: &[&str] = &[
    "text",
    "tinytext",
    "mediumtext",
    "longtext",
    "blob",
    "tinyblob",
    "mediumblob",
    "longblob",
];

/// Whether a native MySQL data type is unbounded text or binary.
pub fn is_long_text_type(data_type: &str) -> bool {
    let lower = data_type.to_lowercase();
    LONG_TEXT_TYPES.contains(&lower.as_str())
}

/// Column types of existing tables, keyed by table then column name.
#[derive(Debug, Default, Clone)]
pub struct ColumnTypeCache {
    tables: HashMap<String, HashMap<String, String>>,
}

impl ColumnTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column types of `table_name`, querying the database on first use.
    pub fn load(
        &mut self,
        table_name: &str,
        handle: &dyn DatabaseHandle,
    ) -> Result<&HashMap<String, String>> {
        if !self.tables.contains_key(table_name) {
            let types = Self::introspect(table_name, handle)?;
            self.tables.insert(table_name.to_string(), types);
        }
        Ok(self.tables.entry(table_name.to_string()).or_default())
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    pub fn forget(&mut self, table_name: &str) {
        self.tables.remove(table_name);
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn introspect(table_name: &str, handle: &dyn DatabaseHandle) -> Result<HashMap<String, String>> {
        let sql = format!(
            "SELECT COLUMN_NAME AS name, DATA_TYPE AS type FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = {}",
            quote_literal(table_name)
        );
        let rows = handle.query(&sql)?;

        let types: HashMap<String, String> = rows
            .iter()
            .filter_map(|row| {
                let name = row.get("name")?;
                let data_type = row.get("type")?;
                Some((name.to_string(), data_type.to_lowercase()))
            })
            .collect();

        debug!(
            table = table_name,
            columns = types.len(),
            "introspected column types"
        );
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{RecordingHandle, Row};

    #[test]
    fn test_long_text_types() {
        assert!(is_long_text_type("text"));
        assert!(is_long_text_type("MEDIUMTEXT"));
        assert!(is_long_text_type("longblob"));
        assert!(!is_long_text_type("varchar"));
        assert!(!is_long_text_type("int"));
    }

    #[test]
    fn test_load_caches_per_table() {
        let handle = RecordingHandle::new();
        handle.respond(
            "TABLE_NAME = 'dtb_a'",
            vec![Row::from_pairs(&[("NAME", "memo"), ("TYPE", "TEXT")])],
        );

        let mut cache = ColumnTypeCache::new();
        let types = cache.load("dtb_a", &handle).unwrap();
        assert_eq!(types.get("memo").map(String::as_str), Some("text"));

        cache.load("dtb_a", &handle).unwrap();
        cache.load("dtb_b", &handle).unwrap();
        assert_eq!(handle.queries().len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_forget_and_clear() {
        let handle = RecordingHandle::new();
        let mut cache = ColumnTypeCache::new();
        cache.load("dtb_a", &handle).unwrap();
        cache.load("dtb_b", &handle).unwrap();

        cache.forget("dtb_a");
        assert!(!cache.contains("dtb_a"));
        assert!(cache.contains("dtb_b"));

        cache.clear();
        assert!(cache.is_empty());

        // a forgotten table is queried again
        cache.load("dtb_a", &handle).unwrap();
        assert_eq!(handle.queries().len(), 3);
    }

    #[test]
    fn test_query_failure_is_not_cached() {
        let handle = RecordingHandle::new();
        handle.fail_on("information_schema");

        let mut cache = ColumnTypeCache::new();
        assert!(cache.load("dtb_a", &handle).is_err());
        assert!(cache.is_empty());
    }
}
