//! MySQL / MariaDB translator

use std::collections::HashMap;

use super::introspect::{is_long_text_type, ColumnTypeCache};
use super::{derived_sequence_name, is_current_timestamp, serial_sequence, DialectName, Platform};
use crate::database::DatabaseHandle;
use crate::error::Result;
use crate::schema::{
    ColumnOptions, ColumnType, Operation, Table, DEFAULT_CHAR_LENGTH, DEFAULT_DECIMAL_PRECISION,
    DEFAULT_DECIMAL_SCALE, DEFAULT_STRING_LENGTH,
};

/// Key prefix length for indexes over `TEXT`/`BLOB` columns.
pub const INDEX_KEY_LENGTH: u32 = 255;

const TABLE_OPTIONS: &str = " ENGINE=InnoDB DEFAULT CHARSET=utf8";

/// InnoDB translator.
///
/// MySQL cannot index an unbounded `TEXT` column without a key prefix, so indexed
/// text columns are rendered as `col(255)`. When indexes are added to an existing
/// table the column types are read from `information_schema` and cached per table
/// until the table has been altered or the cache is cleared.
#[derive(Debug, Default)]
pub struct MySqlPlatform {
    column_types: ColumnTypeCache,
}

impl MySqlPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Introspection results cached so far.
    pub fn column_type_cache(&self) -> &ColumnTypeCache {
        &self.column_types
    }

    fn key_column(column: &str) -> String {
        format!("{}({})", column, INDEX_KEY_LENGTH)
    }
}

/// Columns renamed in an alteration, new name -> old name.
fn renamed_columns(table: &Table) -> HashMap<&str, &str> {
    table
        .operations()
        .iter()
        .filter_map(|op| match op {
            Operation::RenameColumn { from, to } => Some((to.as_str(), from.as_str())),
            _ => None,
        })
        .collect()
}

impl Platform for MySqlPlatform {
    fn dialect(&self) -> DialectName {
        DialectName::MySql
    }

    fn native_type(&self, column_type: ColumnType, options: &ColumnOptions) -> String {
        let native = match column_type {
            ColumnType::Serial | ColumnType::Integer => "INT".to_string(),
            ColumnType::Smallint | ColumnType::Boolean => "SMALLINT".to_string(),
            ColumnType::Bigint => "BIGINT".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::String => format!(
                "VARCHAR({})",
                options.length.unwrap_or(DEFAULT_STRING_LENGTH)
            ),
            ColumnType::Char => {
                format!("CHAR({})", options.length.unwrap_or(DEFAULT_CHAR_LENGTH))
            }
            ColumnType::Decimal => format!(
                "DECIMAL({},{})",
                options.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
                options.scale.unwrap_or(DEFAULT_DECIMAL_SCALE)
            ),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "DATETIME".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
        };

        // boolean shares SMALLINT but is not an integer column for UNSIGNED purposes
        if options.unsigned && column_type.is_integer() {
            format!("{} UNSIGNED", native)
        } else {
            native
        }
    }

    fn auto_increment_syntax(&self) -> &'static str {
        "NOT NULL AUTO_INCREMENT PRIMARY KEY"
    }

    fn composite_serial_syntax(&self) -> &'static str {
        "NOT NULL AUTO_INCREMENT"
    }

    /// Backslash is an escape character in MySQL string literals.
    fn string_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn table_options(&self) -> &'static str {
        TABLE_OPTIONS
    }

    fn translate_default_expression(&self, expression: &str) -> String {
        if is_current_timestamp(expression) {
            "CURRENT_TIMESTAMP".to_string()
        } else {
            expression.to_string()
        }
    }

    fn drop_index_sql(&self, table_name: &str, index_name: &str) -> String {
        format!("DROP INDEX {} ON {}", index_name, table_name)
    }

    fn new_index_column(&self, table: &Table, column: &str) -> String {
        match table.column(column).map(|c| c.column_type()) {
            Some(ColumnType::Text) | Some(ColumnType::Blob) => Self::key_column(column),
            _ => column.to_string(),
        }
    }

    fn altered_index_column(
        &mut self,
        table: &Table,
        column: &str,
        handle: &dyn DatabaseHandle,
    ) -> Result<String> {
        // added in this same alteration
        if table.column(column).is_some() {
            return Ok(self.new_index_column(table, column));
        }

        let renamed = renamed_columns(table);
        let existing_name = renamed.get(column).copied().unwrap_or(column);

        let types = self.column_types.load(table.name(), handle)?;
        let long_text = types
            .get(existing_name)
            .is_some_and(|t| is_long_text_type(t));

        if long_text {
            Ok(Self::key_column(column))
        } else {
            Ok(column.to_string())
        }
    }

    fn forget_table(&mut self, table_name: &str) {
        self.column_types.forget(table_name);
    }

    fn clear_introspection_cache(&mut self) {
        self.column_types.clear();
    }

    /// Sequences are emulated with a one-column auto-increment side table.
    fn create_sequence(&self, table: &Table) -> Option<String> {
        serial_sequence(table).map(|(_, sequence)| {
            format!(
                "CREATE TABLE IF NOT EXISTS {} (\n    sequence INT NOT NULL AUTO_INCREMENT PRIMARY KEY\n){}",
                sequence, TABLE_OPTIONS
            )
        })
    }

    fn drop_sequence(&self, table_name: &str) -> Option<String> {
        Some(format!(
            "DROP TABLE IF EXISTS {}",
            derived_sequence_name(table_name)
        ))
    }

    fn migration_table_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
             id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,\n    \
             version VARCHAR(255) NOT NULL UNIQUE,\n    \
             executed_at DATETIME DEFAULT CURRENT_TIMESTAMP\n){}",
            table_name, TABLE_OPTIONS
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{RecordingHandle, Row};
    use crate::schema::DefaultValue;

    fn customer_table() -> Table {
        let mut table = Table::new("dtb_test");
        table.serial();
        table
    }

    #[test]
    fn test_name() {
        assert_eq!(MySqlPlatform::new().name(), "mysqli");
    }

    #[test]
    fn test_create_table_with_serial() {
        let mut table = customer_table();
        table.text("name").not_null();

        let sql = MySqlPlatform::new().create_table(&table);
        assert_eq!(
            sql,
            "CREATE TABLE dtb_test (\n    \
             test_id INT NOT NULL AUTO_INCREMENT PRIMARY KEY,\n    \
             name TEXT NOT NULL\n) ENGINE=InnoDB DEFAULT CHARSET=utf8"
        );
    }

    #[test]
    fn test_serial_primary_key_is_not_repeated() {
        let sql = MySqlPlatform::new().create_table(&customer_table());
        assert!(!sql.contains("PRIMARY KEY (test_id)"));
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1);
    }

    #[test]
    fn test_non_serial_primary_key_is_trailing() {
        let mut table = Table::new("mtb_code");
        table.string("code", 32);
        table.primary("code");
        table.text("label");

        let sql = MySqlPlatform::new().create_table(&table);
        assert!(sql.contains("code VARCHAR(32) NOT NULL,"));
        assert!(sql.contains("PRIMARY KEY (code)\n)"));
    }

    #[test]
    fn test_column_clauses() {
        let mut table = customer_table();
        table.timestamp("create_date").default("CURRENT_TIMESTAMP");
        table.string("email", 255).not_null();
        table.decimal("price", 12, 2).not_null();
        table.integer("point").unsigned().default(0);
        table.text("note").default("it's");

        let sql = MySqlPlatform::new().create_table(&table);
        assert!(sql.contains("create_date DATETIME DEFAULT CURRENT_TIMESTAMP"));
        assert!(sql.contains("email VARCHAR(255) NOT NULL"));
        assert!(sql.contains("price DECIMAL(12,2) NOT NULL"));
        assert!(sql.contains("point INT UNSIGNED DEFAULT 0"));
        assert!(sql.contains("note TEXT DEFAULT 'it''s'"));
    }

    #[test]
    fn test_backslash_in_default_is_escaped() {
        let platform = MySqlPlatform::new();
        assert_eq!(
            platform.default_value(&DefaultValue::Text("C:\\".to_string())),
            "'C:\\\\'"
        );
        assert_eq!(
            platform.default_value(&DefaultValue::Text("a\\'b".to_string())),
            "'a\\\\''b'"
        );
    }

    #[test]
    fn test_serial_in_composite_key() {
        let mut table = Table::new("dtb_order_item");
        table.serial();
        table.integer("product_id");
        table.primary("product_id");

        let sql = MySqlPlatform::new().create_table(&table);
        assert_eq!(
            sql,
            "CREATE TABLE dtb_order_item (\n    \
             order_item_id INT NOT NULL AUTO_INCREMENT,\n    \
             product_id INT NOT NULL,\n    \
             PRIMARY KEY (order_item_id, product_id)\n) ENGINE=InnoDB DEFAULT CHARSET=utf8"
        );
    }

    #[test]
    fn test_current_timestamp_with_parens() {
        let platform = MySqlPlatform::new();
        assert_eq!(
            platform.translate_default_expression("CURRENT_TIMESTAMP()"),
            "CURRENT_TIMESTAMP"
        );
        assert_eq!(platform.translate_default_expression("NOW()"), "NOW()");
    }

    #[test]
    fn test_column_types() {
        let platform = MySqlPlatform::new();
        let opts = ColumnOptions::default();
        let expected = [
            ("serial", "INT"),
            ("integer", "INT"),
            ("smallint", "SMALLINT"),
            ("bigint", "BIGINT"),
            ("text", "TEXT"),
            ("string", "VARCHAR(255)"),
            ("char", "CHAR(1)"),
            ("decimal", "DECIMAL(10,2)"),
            ("float", "FLOAT"),
            ("date", "DATE"),
            ("time", "TIME"),
            ("timestamp", "DATETIME"),
            ("boolean", "SMALLINT"),
            ("blob", "BLOB"),
        ];
        for (name, native) in expected {
            assert_eq!(platform.column_type(name, &opts).unwrap(), native);
        }
        assert_eq!(
            platform
                .column_type("string", &ColumnOptions::with_length(64))
                .unwrap(),
            "VARCHAR(64)"
        );
    }

    #[test]
    fn test_unsigned_ignored_for_non_integer() {
        let opts = ColumnOptions {
            unsigned: true,
            ..Default::default()
        };
        let platform = MySqlPlatform::new();
        assert_eq!(platform.native_type(ColumnType::Bigint, &opts), "BIGINT UNSIGNED");
        assert_eq!(platform.native_type(ColumnType::Boolean, &opts), "SMALLINT");
        assert_eq!(platform.native_type(ColumnType::Float, &opts), "FLOAT");
    }

    #[test]
    fn test_create_indexes_applies_key_length_to_text() {
        let mut table = customer_table();
        table.text("name");
        table.string("email", 128);
        table.index(&["name"], None);
        table.unique(&["email"], None);
        table.index(&["name", "email"], Some("idx_combo"));

        let indexes = MySqlPlatform::new().create_indexes(&table);
        assert_eq!(
            indexes,
            vec![
                "CREATE INDEX idx_dtb_test_name ON dtb_test (name(255))",
                "CREATE UNIQUE INDEX uniq_dtb_test_email ON dtb_test (email)",
                "CREATE INDEX idx_combo ON dtb_test (name(255), email)",
            ]
        );
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            MySqlPlatform::new().drop_table("dtb_test"),
            "DROP TABLE IF EXISTS dtb_test"
        );
    }

    #[test]
    fn test_alter_table_columns() {
        let handle = RecordingHandle::new();
        let mut table = Table::alter("dtb_test");
        table.text("new_column").nullable();
        table.drop_column("old_column");
        table.rename_column("a", "b");
        table.drop_index("idx_old");

        let statements = MySqlPlatform::new().alter_table(&table, &handle).unwrap();
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE dtb_test ADD COLUMN new_column TEXT",
                "ALTER TABLE dtb_test DROP COLUMN old_column",
                "ALTER TABLE dtb_test RENAME COLUMN a TO b",
                "DROP INDEX idx_old ON dtb_test",
            ]
        );
        // nothing indexed, nothing introspected
        assert!(handle.queries().is_empty());
    }

    #[test]
    fn test_alter_index_on_added_text_column() {
        let handle = RecordingHandle::new();
        let mut table = Table::alter("dtb_test");
        table.text("memo");
        table.add_index(&["memo"], None);

        let statements = MySqlPlatform::new().alter_table(&table, &handle).unwrap();
        assert_eq!(
            statements[1],
            "CREATE INDEX idx_dtb_test_memo ON dtb_test (memo(255))"
        );
        assert!(handle.queries().is_empty());
    }

    #[test]
    fn test_alter_index_introspects_existing_columns() {
        let handle = RecordingHandle::new();
        handle.respond(
            "information_schema.COLUMNS",
            vec![
                Row::from_pairs(&[("name", "login_id"), ("type", "text")]),
                Row::from_pairs(&[("name", "status"), ("type", "smallint")]),
                Row::from_pairs(&[("name", "payload"), ("type", "mediumblob")]),
            ],
        );

        let mut table = Table::alter("dtb_login_attempt");
        table.index(&["login_id", "status"], None);
        table.index(&["payload"], Some("idx_payload"));

        let mut platform = MySqlPlatform::new();
        let statements = platform.alter_table(&table, &handle).unwrap();
        assert_eq!(
            statements,
            vec![
                "CREATE INDEX idx_dtb_login_attempt_login_id_status ON dtb_login_attempt (login_id(255), status)",
                "CREATE INDEX idx_payload ON dtb_login_attempt (payload(255))",
            ]
        );

        // one query per table, scoped to the table being altered
        let queries = handle.queries();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("TABLE_NAME = 'dtb_login_attempt'"));
        assert!(queries[0].contains("TABLE_SCHEMA = DATABASE()"));

        // the entry is dropped once the table has been altered
        assert!(!platform.column_type_cache().contains("dtb_login_attempt"));
    }

    #[test]
    fn test_alter_index_on_renamed_column_uses_old_type() {
        let handle = RecordingHandle::new();
        handle.respond(
            "information_schema.COLUMNS",
            vec![Row::from_pairs(&[("name", "note"), ("type", "longtext")])],
        );

        let mut table = Table::alter("dtb_test");
        table.rename_column("note", "remark");
        table.index(&["remark"], None);

        let statements = MySqlPlatform::new().alter_table(&table, &handle).unwrap();
        assert_eq!(
            statements[1],
            "CREATE INDEX idx_dtb_test_remark ON dtb_test (remark(255))"
        );
    }

    #[test]
    fn test_alter_index_on_unknown_column_has_no_prefix() {
        let handle = RecordingHandle::new();
        let mut table = Table::alter("dtb_test");
        table.index(&["missing"], None);

        let statements = MySqlPlatform::new().alter_table(&table, &handle).unwrap();
        assert_eq!(
            statements[0],
            "CREATE INDEX idx_dtb_test_missing ON dtb_test (missing)"
        );
    }

    #[test]
    fn test_sequence_side_table() {
        let mut table = Table::new("dtb_customer");
        table.serial();
        let platform = MySqlPlatform::new();

        assert_eq!(
            platform.create_sequence(&table).unwrap(),
            "CREATE TABLE IF NOT EXISTS dtb_customer_customer_id_seq (\n    \
             sequence INT NOT NULL AUTO_INCREMENT PRIMARY KEY\n) ENGINE=InnoDB DEFAULT CHARSET=utf8"
        );
        assert_eq!(
            platform.drop_sequence("dtb_customer").unwrap(),
            "DROP TABLE IF EXISTS dtb_customer_customer_id_seq"
        );
        assert!(platform.serial_default_sql(&table).is_none());
    }

    #[test]
    fn test_no_sequence_without_serial() {
        let mut table = Table::new("dtb_test");
        table.integer("n");
        assert!(MySqlPlatform::new().create_sequence(&table).is_none());
    }

    #[test]
    fn test_migration_table_sql() {
        let sql = MySqlPlatform::new().migration_table_sql("schema_migrations");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS schema_migrations ("));
        assert!(sql.contains("id INT NOT NULL AUTO_INCREMENT PRIMARY KEY"));
        assert!(sql.contains("version VARCHAR(255) NOT NULL UNIQUE"));
        assert!(sql.contains("executed_at DATETIME DEFAULT CURRENT_TIMESTAMP"));
        assert!(sql.ends_with("ENGINE=InnoDB DEFAULT CHARSET=utf8"));
    }
}
