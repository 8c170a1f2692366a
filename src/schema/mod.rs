//! Dialect-neutral schema model
//!
//! Migrations describe tables with [`Table`] and [`Column`]; a
//! [`crate::platform::Platform`] turns them into SQL. The values live for a single
//! `create`/`table` call and are then discarded.
//!
//! ```rust,ignore
//! let mut table = Table::new("dtb_login_attempt");
//! table.serial();
//! table.text("login_id").not_null();
//! table.timestamp("create_date").not_null().default("CURRENT_TIMESTAMP");
//! table.index(&["login_id", "create_date"], None);
//! ```

mod column;
mod table;

pub use column::{
    Column, ColumnOptions, ColumnType, DefaultValue, DEFAULT_CHAR_LENGTH,
    DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE, DEFAULT_STRING_LENGTH,
};
pub use table::{derive_serial_column_name, Index, Operation, Table, SERIAL_NAME_PREFIXES};
