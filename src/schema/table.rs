//! Table definitions and alterations
//!
//! A [`Table`] is either a fresh definition (used by `CREATE TABLE`) or, when
//! built with [`Table::alter`], an alteration of an existing table. In alter mode
//! every structural change is also appended to an ordered operation log, which
//! the dialect replays as `ALTER TABLE` / `CREATE INDEX` / `DROP INDEX`
//! statements.

use indexmap::IndexMap;

use super::column::{
    Column, ColumnOptions, ColumnType, DEFAULT_CHAR_LENGTH, DEFAULT_DECIMAL_PRECISION,
    DEFAULT_DECIMAL_SCALE, DEFAULT_STRING_LENGTH,
};

/// Table name prefixes stripped when deriving a serial column name.
pub const SERIAL_NAME_PREFIXES: &[&str] = &["dtb_", "mtb_"];

/// Derive the serial primary-key column name for a table.
///
/// `dtb_customer` and `mtb_customer` both become `customer_id`; any other table
/// name gets `_id` appended (`orders` -> `orders_id`). Sequence drops rely on the
/// same rule since they only know the table name.
pub fn derive_serial_column_name(table_name: &str) -> String {
    for prefix in SERIAL_NAME_PREFIXES {
        if let Some(base) = table_name.strip_prefix(prefix) {
            return format!("{}_id", base);
        }
    }
    format!("{}_id", table_name)
}

/// An index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// One step of an alteration, in the order the migration declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Add the column of this name; its definition lives in the table's column map.
    AddColumn(String),
    DropColumn(String),
    RenameColumn { from: String, to: String },
    AddIndex(Index),
    DropIndex(String),
}

/// Table definition or alteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: IndexMap<String, Column>,
    indexes: Vec<Index>,
    alter: bool,
    operations: Vec<Operation>,
}

impl Table {
    /// Start a new table definition.
    pub fn new(name: &str) -> Self {
        Table {
            name: name.to_string(),
            columns: IndexMap::new(),
            indexes: Vec::new(),
            alter: false,
            operations: Vec::new(),
        }
    }

    /// Start an alteration of an existing table.
    pub fn alter(name: &str) -> Self {
        Table {
            alter: true,
            ..Table::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Primary-key columns in declaration order; more than one makes a composite key.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .values()
            .filter(|c| c.is_primary())
            .map(|c| c.name())
            .collect()
    }

    pub fn is_alter(&self) -> bool {
        self.alter
    }

    /// Operation log; always empty for fresh definitions.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The serial primary-key column, if the table has one.
    pub fn serial_column(&self) -> Option<&Column> {
        self.columns.values().find(|c| c.is_serial_primary())
    }

    // =====================
    // Integer Types
    // =====================

    /// Add the auto-increment primary key, named after the table
    /// (see [`derive_serial_column_name`]).
    pub fn serial(&mut self) -> &mut Column {
        let name = derive_serial_column_name(&self.name);
        let column = self.add_column(&name, ColumnType::Serial, ColumnOptions::default());
        column.primary();
        column
    }

    pub fn integer(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Integer, ColumnOptions::default())
    }

    pub fn smallint(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Smallint, ColumnOptions::default())
    }

    pub fn bigint(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Bigint, ColumnOptions::default())
    }

    // =====================
    // String Types
    // =====================

    pub fn text(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Text, ColumnOptions::default())
    }

    /// `VARCHAR` column of the given length.
    pub fn string(&mut self, name: &str, length: u32) -> &mut Column {
        self.add_column(name, ColumnType::String, ColumnOptions::with_length(length))
    }

    /// `VARCHAR(255)` column.
    pub fn varchar(&mut self, name: &str) -> &mut Column {
        self.string(name, DEFAULT_STRING_LENGTH)
    }

    pub fn char(&mut self, name: &str, length: u32) -> &mut Column {
        self.add_column(name, ColumnType::Char, ColumnOptions::with_length(length))
    }

    /// Single-character `CHAR` column.
    pub fn flag(&mut self, name: &str) -> &mut Column {
        self.char(name, DEFAULT_CHAR_LENGTH)
    }

    // =====================
    // Numeric Types
    // =====================

    pub fn decimal(&mut self, name: &str, precision: u32, scale: u32) -> &mut Column {
        self.add_column(
            name,
            ColumnType::Decimal,
            ColumnOptions::with_precision(precision, scale),
        )
    }

    /// `DECIMAL(10,2)` column.
    pub fn money(&mut self, name: &str) -> &mut Column {
        self.decimal(name, DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE)
    }

    pub fn float(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Float, ColumnOptions::default())
    }

    // =====================
    // Date/Time Types
    // =====================

    pub fn date(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Date, ColumnOptions::default())
    }

    pub fn time(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Time, ColumnOptions::default())
    }

    pub fn timestamp(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Timestamp, ColumnOptions::default())
    }

    // =====================
    // Other Types
    // =====================

    pub fn boolean(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Boolean, ColumnOptions::default())
    }

    pub fn blob(&mut self, name: &str) -> &mut Column {
        self.add_column(name, ColumnType::Blob, ColumnOptions::default())
    }

    // =====================
    // Column Operations
    // =====================

    /// Add a column. Re-adding a name replaces the earlier definition in place.
    pub fn add_column(
        &mut self,
        name: &str,
        column_type: ColumnType,
        options: ColumnOptions,
    ) -> &mut Column {
        if self.alter {
            self.operations
                .push(Operation::AddColumn(name.to_string()));
        }

        let column = Column::new(name, column_type, options);
        let entry = self.columns.entry(name.to_string());
        match entry {
            indexmap::map::Entry::Occupied(mut slot) => {
                slot.insert(column);
                slot.into_mut()
            }
            indexmap::map::Entry::Vacant(slot) => slot.insert(column),
        }
    }

    pub fn drop_column(&mut self, name: &str) -> &mut Self {
        self.operations
            .push(Operation::DropColumn(name.to_string()));
        self
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.operations.push(Operation::RenameColumn {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    // =====================
    // Primary Key
    // =====================

    /// Mark an already-declared column as part of the primary key.
    pub fn primary(&mut self, column: &str) -> &mut Self {
        if let Some(c) = self.columns.get_mut(column) {
            c.primary();
        }
        self
    }

    // =====================
    // Indexes
    // =====================

    /// Add a non-unique index; the name defaults to `idx_<table>_<columns>`.
    pub fn index(&mut self, columns: &[&str], name: Option<&str>) -> &mut Self {
        self.push_index(columns, name, false)
    }

    /// Add a unique index; the name defaults to `uniq_<table>_<columns>`.
    pub fn unique(&mut self, columns: &[&str], name: Option<&str>) -> &mut Self {
        self.push_index(columns, name, true)
    }

    pub fn add_index(&mut self, columns: &[&str], name: Option<&str>) -> &mut Self {
        self.index(columns, name)
    }

    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.operations
            .push(Operation::DropIndex(name.to_string()));
        self
    }

    fn push_index(&mut self, columns: &[&str], name: Option<&str>, unique: bool) -> &mut Self {
        let prefix = if unique { "uniq" } else { "idx" };
        let index = Index {
            name: name
                .map(str::to_string)
                .unwrap_or_else(|| self.generate_index_name(columns, prefix)),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique,
        };

        if self.alter {
            self.operations.push(Operation::AddIndex(index.clone()));
        }
        self.indexes.push(index);
        self
    }

    fn generate_index_name(&self, columns: &[&str], prefix: &str) -> String {
        format!("{}_{}_{}", prefix, self.name, columns.join("_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_column_name_derivation() {
        assert_eq!(derive_serial_column_name("dtb_customer"), "customer_id");
        assert_eq!(
            derive_serial_column_name("dtb_login_attempt"),
            "login_attempt_id"
        );
        assert_eq!(derive_serial_column_name("mtb_pref"), "pref_id");
        assert_eq!(derive_serial_column_name("orders"), "orders_id");
    }

    #[test]
    fn test_serial_is_primary_and_not_null() {
        let mut table = Table::new("dtb_customer");
        table.serial();

        let column = table.column("customer_id").unwrap();
        assert_eq!(column.column_type(), ColumnType::Serial);
        assert!(column.is_primary());
        assert!(!column.is_nullable());
        assert_eq!(table.primary_key(), vec!["customer_id"]);
        assert_eq!(table.serial_column().map(|c| c.name()), Some("customer_id"));
    }

    #[test]
    fn test_columns_keep_declaration_order() {
        let mut table = Table::new("dtb_test");
        table.text("b");
        table.integer("a");
        table.timestamp("c");

        let names: Vec<&str> = table.columns().map(|c| c.name()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_readding_column_replaces_definition() {
        let mut table = Table::new("dtb_test");
        table.text("name");
        table.integer("name").not_null();

        assert_eq!(table.columns().count(), 1);
        assert_eq!(
            table.column("name").unwrap().column_type(),
            ColumnType::Integer
        );
    }

    #[test]
    fn test_typed_options() {
        let mut table = Table::new("dtb_test");
        table.string("email", 128);
        table.varchar("name");
        table.decimal("price", 12, 4);
        table.money("total");

        assert_eq!(table.column("email").unwrap().options().length, Some(128));
        assert_eq!(table.column("name").unwrap().options().length, Some(255));
        let price = table.column("price").unwrap().options();
        assert_eq!((price.precision, price.scale), (Some(12), Some(4)));
        let total = table.column("total").unwrap().options();
        assert_eq!((total.precision, total.scale), (Some(10), Some(2)));
    }

    #[test]
    fn test_index_names() {
        let mut table = Table::new("dtb_test");
        table.index(&["login_id", "create_date"], None);
        table.unique(&["email"], None);
        table.index(&["name"], Some("custom_idx"));

        let names: Vec<&str> = table.indexes().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "idx_dtb_test_login_id_create_date",
                "uniq_dtb_test_email",
                "custom_idx"
            ]
        );
        assert!(table.indexes()[1].unique);
    }

    #[test]
    fn test_definition_mode_has_no_operations() {
        let mut table = Table::new("dtb_test");
        table.text("name");
        table.index(&["name"], None);
        assert!(!table.is_alter());
        assert!(table.operations().is_empty());
    }

    #[test]
    fn test_alter_mode_records_operations_in_order() {
        let mut table = Table::alter("dtb_test");
        table.text("new_column").nullable();
        table.add_index(&["new_column"], None);
        table.rename_column("old", "renamed");
        table.drop_index("idx_old");
        table.drop_column("gone");

        assert!(table.is_alter());
        assert_eq!(
            table.operations(),
            &[
                Operation::AddColumn("new_column".to_string()),
                Operation::AddIndex(Index {
                    name: "idx_dtb_test_new_column".to_string(),
                    columns: vec!["new_column".to_string()],
                    unique: false,
                }),
                Operation::RenameColumn {
                    from: "old".to_string(),
                    to: "renamed".to_string(),
                },
                Operation::DropIndex("idx_old".to_string()),
                Operation::DropColumn("gone".to_string()),
            ]
        );
    }

    #[test]
    fn test_primary_on_declared_column() {
        let mut table = Table::new("dtb_test");
        table.string("code", 32);
        table.primary("code");

        assert_eq!(table.primary_key(), vec!["code"]);
        assert!(table.column("code").unwrap().is_primary());
        assert!(table.serial_column().is_none());
    }

    #[test]
    fn test_composite_primary_key_columns() {
        let mut table = Table::new("dtb_order_item");
        table.integer("order_id");
        table.integer("product_id");
        table.primary("product_id").primary("order_id");

        assert_eq!(table.primary_key(), vec!["order_id", "product_id"]);
    }
}
