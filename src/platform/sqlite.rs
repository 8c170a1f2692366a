//! SQLite translator

use super::{is_current_timestamp, DialectName, Platform};
use crate::schema::{ColumnOptions, ColumnType};

/// SQLite translator.
///
/// Columns only carry a type affinity, so lengths and precisions are dropped.
/// A serial column becomes `INTEGER PRIMARY KEY`, an alias of the rowid, so no
/// sequence is needed. Inside a composite key it is a plain `INTEGER NOT NULL`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlitePlatform;

impl SqlitePlatform {
    pub fn new() -> Self {
        SqlitePlatform
    }
}

impl Platform for SqlitePlatform {
    fn dialect(&self) -> DialectName {
        DialectName::Sqlite
    }

    fn native_type(&self, column_type: ColumnType, _options: &ColumnOptions) -> String {
        match column_type {
            ColumnType::Serial
            | ColumnType::Integer
            | ColumnType::Smallint
            | ColumnType::Bigint
            | ColumnType::Boolean => "INTEGER",
            ColumnType::Text
            | ColumnType::String
            | ColumnType::Char
            | ColumnType::Date
            | ColumnType::Time
            | ColumnType::Timestamp => "TEXT",
            ColumnType::Decimal | ColumnType::Float => "REAL",
            ColumnType::Blob => "BLOB",
        }
        .to_string()
    }

    fn auto_increment_syntax(&self) -> &'static str {
        "PRIMARY KEY"
    }

    fn primary_key_inline(&self) -> bool {
        true
    }

    fn translate_default_expression(&self, expression: &str) -> String {
        if is_current_timestamp(expression) {
            "(datetime('now','localtime'))".to_string()
        } else {
            expression.to_string()
        }
    }

    fn migration_table_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
             id INTEGER PRIMARY KEY,\n    \
             version TEXT NOT NULL UNIQUE,\n    \
             executed_at TEXT DEFAULT (datetime('now','localtime'))\n)",
            table_name
        )
    }
}
