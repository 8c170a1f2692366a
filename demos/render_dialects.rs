//! Dialect Rendering Example
//!
//! Renders one table definition as MySQL, PostgreSQL and SQLite DDL without
//! touching a database.
//!
//! # Running
//!
//! ```bash
//! cargo run --example render_dialects --no-default-features
//! ```

use strata::{create_platform, DialectName, Table};

fn main() {
    let mut table = Table::new("dtb_login_attempt");
    table.serial();
    table.text("login_id").not_null();
    table.text("client_ip");
    table.timestamp("create_date").not_null().default("CURRENT_TIMESTAMP");
    table.index(&["login_id", "create_date"], None);

    for dialect in DialectName::ALL {
        let platform = create_platform(dialect);
        println!("-- {}", dialect);
        println!("{};", platform.create_table(&table));
        for sql in platform.create_indexes(&table) {
            println!("{};", sql);
        }
        if let Some(sql) = platform.create_sequence(&table) {
            println!("{};", sql);
        }
        if let Some(sql) = platform.serial_default_sql(&table) {
            println!("{};", sql);
        }
        println!();
    }
}
