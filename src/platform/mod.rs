//! Dialect translation
//!
//! A [`Platform`] turns the abstract schema model into SQL for one database
//! engine. The statement shapes are shared and live in the trait's provided
//! methods; each engine only fills in the hooks where it differs (type map,
//! auto-increment clause, table options, default expressions, index syntax and
//! sequence emulation).
//!
//! ```text
//! platform/
//! ├── mysql       # InnoDB options, emulated sequences, index key lengths
//! ├── postgres    # native sequences + nextval() defaults
//! ├── sqlite      # type affinity, inline primary keys
//! └── introspect  # column types of existing tables (MySQL alter mode)
//! ```

mod introspect;
mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::database::DatabaseHandle;
use crate::error::{Error, Result};
use crate::schema::{
    derive_serial_column_name, Column, ColumnOptions, ColumnType, DefaultValue, Index, Operation,
    Table,
};

pub use introspect::ColumnTypeCache;
pub use mysql::MySqlPlatform;
pub use postgres::PostgreSqlPlatform;
pub use sqlite::SqlitePlatform;

#[allow(clippy::expect_used)]
static SQL_EXPRESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z_]+(\(\))?$").expect("valid SQL expression regex"));

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DialectName {
    MySql,
    PostgreSql,
    Sqlite,
}

impl DialectName {
    pub const ALL: [DialectName; 3] = [
        DialectName::MySql,
        DialectName::PostgreSql,
        DialectName::Sqlite,
    ];

    /// Canonical name, as stored in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectName::MySql => "mysqli",
            DialectName::PostgreSql => "pgsql",
            DialectName::Sqlite => "sqlite3",
        }
    }

    /// Every spelling accepted for this dialect, canonical first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            DialectName::MySql => &["mysqli", "mysql"],
            DialectName::PostgreSql => &["pgsql", "postgres", "postgresql"],
            DialectName::Sqlite => &["sqlite3", "sqlite"],
        }
    }
}

impl fmt::Display for DialectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        DialectName::ALL
            .iter()
            .copied()
            .find(|d| d.aliases().contains(&lower.as_str()))
            .ok_or_else(|| Error::UnsupportedDialect(s.to_string()))
    }
}

impl TryFrom<String> for DialectName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DialectName> for String {
    fn from(d: DialectName) -> Self {
        d.as_str().to_string()
    }
}

/// Build the translator for a dialect.
pub fn create_platform(dialect: DialectName) -> Box<dyn Platform> {
    match dialect {
        DialectName::MySql => Box::new(MySqlPlatform::new()),
        DialectName::PostgreSql => Box::new(PostgreSqlPlatform::new()),
        DialectName::Sqlite => Box::new(SqlitePlatform::new()),
    }
}

/// Build the translator for a database type name such as `mysql` or `sqlite3`.
pub fn platform_for(db_type: &str) -> Result<Box<dyn Platform>> {
    Ok(create_platform(db_type.parse()?))
}

/// True when a text default is a bare SQL expression token (`CURRENT_TIMESTAMP`,
/// `NOW()`), which is rendered unquoted.
pub fn is_sql_expression(value: &str) -> bool {
    SQL_EXPRESSION_RE.is_match(value)
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Name of the sequence (or emulation table) backing a serial column.
pub fn sequence_name(table_name: &str, column_name: &str) -> String {
    format!("{}_{}_seq", table_name, column_name)
}

/// Sequence name for a table whose serial column follows the naming convention.
pub fn derived_sequence_name(table_name: &str) -> String {
    sequence_name(table_name, &derive_serial_column_name(table_name))
}

/// SQL generation for one database engine.
pub trait Platform {
    // =====================
    // Dialect hooks
    // =====================

    fn dialect(&self) -> DialectName;

    /// Native type for an abstract column type.
    fn native_type(&self, column_type: ColumnType, options: &ColumnOptions) -> String;

    /// Clause appended to a serial primary-key column. Always carries `PRIMARY KEY`.
    fn auto_increment_syntax(&self) -> &'static str;

    /// Clause for a serial column that is one part of a composite primary key.
    fn composite_serial_syntax(&self) -> &'static str {
        "NOT NULL"
    }

    /// Whether non-serial primary keys are declared inline on the column.
    fn primary_key_inline(&self) -> bool {
        false
    }

    /// Suffix appended to every `CREATE TABLE`.
    fn table_options(&self) -> &'static str {
        ""
    }

    /// Render a string literal.
    fn string_literal(&self, value: &str) -> String {
        quote_literal(value)
    }

    /// Translate a bare expression token used as a column default.
    fn translate_default_expression(&self, expression: &str) -> String {
        expression.to_string()
    }

    fn drop_index_sql(&self, _table_name: &str, index_name: &str) -> String {
        format!("DROP INDEX {}", index_name)
    }

    fn drop_column_sql(&self, table_name: &str, column_name: &str) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            table_name, column_name
        )]
    }

    fn rename_column_sql(&self, table_name: &str, from: &str, to: &str) -> String {
        format!("ALTER TABLE {} RENAME COLUMN {} TO {}", table_name, from, to)
    }

    /// Render an index column of a table being created.
    fn new_index_column(&self, _table: &Table, column: &str) -> String {
        column.to_string()
    }

    /// Render an index column added to an existing table.
    ///
    /// Dialects that need the column's live type may query it through `handle`.
    fn altered_index_column(
        &mut self,
        _table: &Table,
        column: &str,
        _handle: &dyn DatabaseHandle,
    ) -> Result<String> {
        Ok(column.to_string())
    }

    /// Drop anything cached about a table after it has been altered.
    fn forget_table(&mut self, _table_name: &str) {}

    /// Drop all cached introspection results.
    fn clear_introspection_cache(&mut self) {}

    /// Statement creating the sequence behind the table's serial column.
    fn create_sequence(&self, _table: &Table) -> Option<String> {
        None
    }

    /// Statement dropping the sequence of a table, derived from its name alone.
    fn drop_sequence(&self, _table_name: &str) -> Option<String> {
        None
    }

    /// Statement wiring the serial column to its sequence after the table exists.
    fn serial_default_sql(&self, _table: &Table) -> Option<String> {
        None
    }

    /// `CREATE TABLE IF NOT EXISTS` for the bookkeeping table.
    fn migration_table_sql(&self, table_name: &str) -> String;

    // =====================
    // Shared statement shapes
    // =====================

    /// Canonical dialect name.
    fn name(&self) -> &'static str {
        self.dialect().as_str()
    }

    /// `CREATE TABLE` with one primary key.
    ///
    /// A single key column is declared inline when it is serial or the dialect
    /// inlines keys. Several key columns always become one trailing
    /// `PRIMARY KEY (...)`, serial column first.
    fn create_table(&self, table: &Table) -> String {
        let mut keys: Vec<&Column> = table.columns().filter(|c| c.is_primary()).collect();
        let composite = keys.len() > 1;

        let mut definitions: Vec<String> = table
            .columns()
            .map(|c| render_column(self, c, composite))
            .collect();

        if composite {
            // MySQL only accepts an auto-increment column leading its key
            keys.sort_by_key(|c| !c.is_serial_primary());
        } else {
            keys.retain(|c| !c.is_serial_primary() && !self.primary_key_inline());
        }
        if !keys.is_empty() {
            let names: Vec<&str> = keys.iter().map(|c| c.name()).collect();
            definitions.push(format!("PRIMARY KEY ({})", names.join(", ")));
        }

        format!(
            "CREATE TABLE {} (\n    {}\n){}",
            table.name(),
            definitions.join(",\n    "),
            self.table_options()
        )
    }

    fn create_indexes(&self, table: &Table) -> Vec<String> {
        table
            .indexes()
            .iter()
            .map(|index| {
                let columns = index
                    .columns
                    .iter()
                    .map(|c| self.new_index_column(table, c))
                    .collect::<Vec<_>>();
                index_sql(table.name(), index, &columns)
            })
            .collect()
    }

    fn alter_table(&mut self, table: &Table, handle: &dyn DatabaseHandle) -> Result<Vec<String>> {
        let mut statements = Vec::new();

        for operation in table.operations() {
            match operation {
                Operation::AddColumn(name) => {
                    if let Some(column) = table.column(name) {
                        statements.push(format!(
                            "ALTER TABLE {} ADD COLUMN {}",
                            table.name(),
                            self.column_definition(column)
                        ));
                    }
                }
                Operation::DropColumn(name) => {
                    statements.extend(self.drop_column_sql(table.name(), name));
                }
                Operation::RenameColumn { from, to } => {
                    statements.push(self.rename_column_sql(table.name(), from, to));
                }
                Operation::AddIndex(index) => {
                    let mut columns = Vec::with_capacity(index.columns.len());
                    for column in &index.columns {
                        columns.push(self.altered_index_column(table, column, handle)?);
                    }
                    statements.push(index_sql(table.name(), index, &columns));
                }
                Operation::DropIndex(name) => {
                    statements.push(self.drop_index_sql(table.name(), name));
                }
            }
        }

        self.forget_table(table.name());
        Ok(statements)
    }

    fn drop_table(&self, table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", table_name)
    }

    /// `name TYPE [AUTO-INC | PRIMARY KEY] [NOT NULL] [DEFAULT value]`
    fn column_definition(&self, column: &Column) -> String {
        render_column(self, column, false)
    }

    /// Native type for an abstract type given by name.
    fn column_type(&self, abstract_type: &str, options: &ColumnOptions) -> Result<String> {
        let column_type: ColumnType = abstract_type.parse()?;
        Ok(self.native_type(column_type, options))
    }

    fn default_value(&self, value: &DefaultValue) -> String {
        match value {
            DefaultValue::Null => "NULL".to_string(),
            DefaultValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            DefaultValue::Int(i) => i.to_string(),
            // NaN and infinities have no SQL literal
            DefaultValue::Float(f) if !f.is_finite() => "NULL".to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::Text(s) if is_sql_expression(s) => self.translate_default_expression(s),
            DefaultValue::Text(s) => self.string_literal(s),
        }
    }
}

fn render_column<P: Platform + ?Sized>(platform: &P, column: &Column, composite_key: bool) -> String {
    let mut parts = vec![
        column.name().to_string(),
        platform.native_type(column.column_type(), column.options()),
    ];

    // the serial clauses already imply NOT NULL
    let mut not_null_done = false;
    if column.is_serial_primary() {
        parts.push(if composite_key {
            platform.composite_serial_syntax().to_string()
        } else {
            platform.auto_increment_syntax().to_string()
        });
        not_null_done = true;
    } else if column.is_primary() && !composite_key && platform.primary_key_inline() {
        parts.push("PRIMARY KEY".to_string());
    }

    if !not_null_done && !column.is_nullable() {
        parts.push("NOT NULL".to_string());
    }

    if let Some(value) = column.default_value() {
        parts.push(format!("DEFAULT {}", platform.default_value(value)));
    }

    parts.join(" ")
}

fn index_sql(table_name: &str, index: &Index, columns: &[String]) -> String {
    format!(
        "CREATE {} {} ON {} ({})",
        if index.unique { "UNIQUE INDEX" } else { "INDEX" },
        index.name,
        table_name,
        columns.join(", ")
    )
}

/// The serial primary column of a table together with its sequence name.
fn serial_sequence(table: &Table) -> Option<(&Column, String)> {
    table
        .serial_column()
        .map(|c| (c, sequence_name(table.name(), c.name())))
}

/// `CURRENT_TIMESTAMP()` and `CURRENT_TIMESTAMP` both mean the current time.
fn is_current_timestamp(expression: &str) -> bool {
    expression == "CURRENT_TIMESTAMP" || expression == "CURRENT_TIMESTAMP()"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_synonyms() {
        assert_eq!("mysqli".parse::<DialectName>().unwrap(), DialectName::MySql);
        assert_eq!("mysql".parse::<DialectName>().unwrap(), DialectName::MySql);
        assert_eq!(
            "pgsql".parse::<DialectName>().unwrap(),
            DialectName::PostgreSql
        );
        assert_eq!(
            "postgres".parse::<DialectName>().unwrap(),
            DialectName::PostgreSql
        );
        assert_eq!(
            "PostgreSQL".parse::<DialectName>().unwrap(),
            DialectName::PostgreSql
        );
        assert_eq!(
            "sqlite3".parse::<DialectName>().unwrap(),
            DialectName::Sqlite
        );
        assert_eq!("sqlite".parse::<DialectName>().unwrap(), DialectName::Sqlite);
    }

    #[test]
    fn test_unsupported_dialect() {
        assert!(matches!(
            "oracle".parse::<DialectName>(),
            Err(Error::UnsupportedDialect(name)) if name == "oracle"
        ));
        assert!(platform_for("mssql").is_err());
    }

    #[test]
    fn test_platform_names_are_canonical() {
        assert_eq!(platform_for("mysql").unwrap().name(), "mysqli");
        assert_eq!(platform_for("postgresql").unwrap().name(), "pgsql");
        assert_eq!(platform_for("sqlite").unwrap().name(), "sqlite3");
    }

    #[test]
    fn test_sql_expression_detection() {
        assert!(is_sql_expression("CURRENT_TIMESTAMP"));
        assert!(is_sql_expression("CURRENT_TIMESTAMP()"));
        assert!(is_sql_expression("NOW()"));
        assert!(!is_sql_expression("now()"));
        assert!(!is_sql_expression("CURRENT TIMESTAMP"));
        assert!(!is_sql_expression("NOW(1)"));
        assert!(!is_sql_expression(""));
    }

    #[test]
    fn test_quote_literal_doubles_quotes() {
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_default_value_is_total() {
        let values = [
            DefaultValue::Null,
            DefaultValue::Bool(true),
            DefaultValue::Bool(false),
            DefaultValue::Int(-3),
            DefaultValue::Float(1.5),
            DefaultValue::Text("CURRENT_TIMESTAMP".to_string()),
            DefaultValue::Text("hello".to_string()),
        ];
        for dialect in DialectName::ALL {
            let platform = create_platform(dialect);
            let rendered: Vec<String> = values.iter().map(|v| platform.default_value(v)).collect();
            let again: Vec<String> = values.iter().map(|v| platform.default_value(v)).collect();
            assert_eq!(rendered, again);
            assert_eq!(rendered[0], "NULL");
            assert_eq!(rendered[1], "1");
            assert_eq!(rendered[2], "0");
            assert_eq!(rendered[3], "-3");
            assert_eq!(rendered[4], "1.5");
            assert_eq!(rendered[6], "'hello'");
        }
    }

    #[test]
    fn test_non_finite_float_default_is_null() {
        for dialect in DialectName::ALL {
            let platform = create_platform(dialect);
            for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                assert_eq!(platform.default_value(&DefaultValue::Float(f)), "NULL");
            }
        }
    }

    #[test]
    fn test_one_primary_key_per_table() {
        let mut table = Table::new("dtb_order_item");
        table.serial();
        table.integer("product_id");
        table.primary("product_id");

        for dialect in DialectName::ALL {
            let sql = create_platform(dialect).create_table(&table);
            assert_eq!(sql.matches("PRIMARY KEY").count(), 1, "{dialect}: {sql}");
            assert!(sql.contains("PRIMARY KEY (order_item_id, product_id)"));
        }
    }

    #[test]
    fn test_unknown_column_type() {
        for dialect in DialectName::ALL {
            let platform = create_platform(dialect);
            assert!(matches!(
                platform.column_type("geometry", &ColumnOptions::default()),
                Err(Error::UnknownColumnType(name)) if name == "geometry"
            ));
        }
    }

    #[test]
    fn test_sequence_names_are_symmetric() {
        let mut table = Table::new("dtb_customer");
        table.serial();
        let (_, created) = serial_sequence(&table).unwrap();
        assert_eq!(created, "dtb_customer_customer_id_seq");
        assert_eq!(derived_sequence_name("dtb_customer"), created);

        let mut table = Table::new("mtb_zip");
        table.serial();
        let (_, created) = serial_sequence(&table).unwrap();
        assert_eq!(derived_sequence_name("mtb_zip"), created);
    }
}
