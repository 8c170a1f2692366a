//! PostgreSQL translator

use super::{derived_sequence_name, is_current_timestamp, serial_sequence, DialectName, Platform};
use crate::schema::{
    ColumnOptions, ColumnType, Table, DEFAULT_CHAR_LENGTH, DEFAULT_DECIMAL_PRECISION,
    DEFAULT_DECIMAL_SCALE, DEFAULT_STRING_LENGTH,
};

/// PostgreSQL translator.
///
/// Serial columns are plain `INT` backed by a named sequence; the sequence is
/// created after the table and attached with `SET DEFAULT nextval(...)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgreSqlPlatform;

impl PostgreSqlPlatform {
    pub fn new() -> Self {
        PostgreSqlPlatform
    }
}

impl Platform for PostgreSqlPlatform {
    fn dialect(&self) -> DialectName {
        DialectName::PostgreSql
    }

    fn native_type(&self, column_type: ColumnType, options: &ColumnOptions) -> String {
        match column_type {
            ColumnType::Serial => "INT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
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
                "NUMERIC({},{})",
                options.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
                options.scale.unwrap_or(DEFAULT_DECIMAL_SCALE)
            ),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Blob => "BYTEA".to_string(),
        }
    }

    fn auto_increment_syntax(&self) -> &'static str {
        "NOT NULL PRIMARY KEY"
    }

    fn translate_default_expression(&self, expression: &str) -> String {
        if is_current_timestamp(expression) {
            "CURRENT_TIMESTAMP".to_string()
        } else {
            expression.to_string()
        }
    }

    fn create_sequence(&self, table: &Table) -> Option<String> {
        serial_sequence(table).map(|(_, sequence)| {
            format!(
                "CREATE SEQUENCE IF NOT EXISTS {} START WITH 1 INCREMENT BY 1",
                sequence
            )
        })
    }

    fn drop_sequence(&self, table_name: &str) -> Option<String> {
        Some(format!(
            "DROP SEQUENCE IF EXISTS {}",
            derived_sequence_name(table_name)
        ))
    }

    fn serial_default_sql(&self, table: &Table) -> Option<String> {
        serial_sequence(table).map(|(column, sequence)| {
            format!(
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT nextval('{}')",
                table.name(),
                column.name(),
                sequence
            )
        })
    }

    fn migration_table_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
             id SERIAL PRIMARY KEY,\n    \
             version VARCHAR(255) NOT NULL UNIQUE,\n    \
             executed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n)",
            table_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::RecordingHandle;

    #[test]
    fn test_name() {
        assert_eq!(PostgreSqlPlatform::new().name(), "pgsql");
    }

    #[test]
    fn test_create_table_with_serial() {
        let mut table = Table::new("dtb_test");
        table.serial();
        table.text("name").not_null();
        table.timestamp("create_date").default("CURRENT_TIMESTAMP()");

        let sql = PostgreSqlPlatform::new().create_table(&table);
        assert_eq!(
            sql,
            "CREATE TABLE dtb_test (\n    \
             test_id INT NOT NULL PRIMARY KEY,\n    \
             name TEXT NOT NULL,\n    \
             create_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n)"
        );
    }

    #[test]
    fn test_composite_primary_key() {
        let mut table = Table::new("dtb_link");
        table.integer("a_id");
        table.integer("b_id");
        table.primary("a_id").primary("b_id");

        let sql = PostgreSqlPlatform::new().create_table(&table);
        assert!(sql.contains("a_id INTEGER NOT NULL"));
        assert!(sql.contains("PRIMARY KEY (a_id, b_id)"));
    }

    #[test]
    fn test_column_types() {
        let platform = PostgreSqlPlatform::new();
        let opts = ColumnOptions::default();
        assert_eq!(platform.column_type("serial", &opts).unwrap(), "INT");
        assert_eq!(platform.column_type("integer", &opts).unwrap(), "INTEGER");
        assert_eq!(
            platform
                .column_type("decimal", &ColumnOptions::with_precision(8, 3))
                .unwrap(),
            "NUMERIC(8,3)"
        );
        assert_eq!(platform.column_type("float", &opts).unwrap(), "REAL");
        assert_eq!(
            platform.column_type("timestamp", &opts).unwrap(),
            "TIMESTAMP"
        );
        assert_eq!(platform.column_type("boolean", &opts).unwrap(), "SMALLINT");
        assert_eq!(platform.column_type("blob", &opts).unwrap(), "BYTEA");
        assert_eq!(
            platform
                .column_type("char", &ColumnOptions::with_length(2))
                .unwrap(),
            "CHAR(2)"
        );
    }

    #[test]
    fn test_unsigned_is_ignored() {
        let opts = ColumnOptions {
            unsigned: true,
            ..Default::default()
        };
        assert_eq!(
            PostgreSqlPlatform::new().native_type(ColumnType::Integer, &opts),
            "INTEGER"
        );
    }

    #[test]
    fn test_sequence_statements() {
        let mut table = Table::new("dtb_customer");
        table.serial();
        let platform = PostgreSqlPlatform::new();

        assert_eq!(
            platform.create_sequence(&table).unwrap(),
            "CREATE SEQUENCE IF NOT EXISTS dtb_customer_customer_id_seq START WITH 1 INCREMENT BY 1"
        );
        assert_eq!(
            platform.serial_default_sql(&table).unwrap(),
            "ALTER TABLE dtb_customer ALTER COLUMN customer_id SET DEFAULT nextval('dtb_customer_customer_id_seq')"
        );
        assert_eq!(
            platform.drop_sequence("dtb_customer").unwrap(),
            "DROP SEQUENCE IF EXISTS dtb_customer_customer_id_seq"
        );
    }

    #[test]
    fn test_unprefixed_table_sequence() {
        let mut table = Table::new("orders");
        table.serial();
        let platform = PostgreSqlPlatform::new();

        assert_eq!(
            platform.create_sequence(&table).unwrap(),
            "CREATE SEQUENCE IF NOT EXISTS orders_orders_id_seq START WITH 1 INCREMENT BY 1"
        );
        assert_eq!(
            platform.drop_sequence("orders").unwrap(),
            "DROP SEQUENCE IF EXISTS orders_orders_id_seq"
        );
    }

    #[test]
    fn test_no_sequence_without_serial() {
        let mut table = Table::new("dtb_test");
        table.text("name");
        let platform = PostgreSqlPlatform::new();
        assert!(platform.create_sequence(&table).is_none());
        assert!(platform.serial_default_sql(&table).is_none());
    }

    #[test]
    fn test_text_index_has_no_key_length() {
        let mut table = Table::new("dtb_test");
        table.text("name");
        table.index(&["name"], None);
        assert_eq!(
            PostgreSqlPlatform::new().create_indexes(&table),
            vec!["CREATE INDEX idx_dtb_test_name ON dtb_test (name)"]
        );
    }

    #[test]
    fn test_alter_table() {
        let handle = RecordingHandle::new();
        let mut table = Table::alter("dtb_test");
        table.string("email", 100).not_null().default("");
        table.unique(&["email"], None);
        table.drop_index("idx_old");

        let statements = PostgreSqlPlatform::new()
            .alter_table(&table, &handle)
            .unwrap();
        assert_eq!(
            statements,
            vec![
                "ALTER TABLE dtb_test ADD COLUMN email VARCHAR(100) NOT NULL DEFAULT ''",
                "CREATE UNIQUE INDEX uniq_dtb_test_email ON dtb_test (email)",
                "DROP INDEX idx_old",
            ]
        );
        assert!(handle.queries().is_empty());
    }

    #[test]
    fn test_migration_table_sql() {
        let sql = PostgreSqlPlatform::new().migration_table_sql("schema_migrations");
        assert!(sql.contains("id SERIAL PRIMARY KEY"));
        assert!(sql.contains("version VARCHAR(255) NOT NULL UNIQUE"));
        assert!(sql.contains("executed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP"));
    }
}
