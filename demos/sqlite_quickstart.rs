//! SQLite Quick Start
//!
//! Applies two migrations to an in-memory SQLite database, prints their status,
//! then reverts the newest one.
//!
//! # Running
//!
//! ```bash
//! cargo run --example sqlite_quickstart --no-default-features
//! ```

use strata::{DatabaseConn, Migration, MigrationContext, MigrationRegistry, Migrator, Result};

struct CreateCustomerTable;

impl Migration for CreateCustomerTable {
    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        ctx.create("dtb_customer", |t| {
            t.serial();
            t.text("name").not_null();
            t.timestamp("create_date").not_null().default("CURRENT_TIMESTAMP");
        })
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        ctx.drop("dtb_customer")
    }
}

struct AddCustomerEmail;

impl Migration for AddCustomerEmail {
    fn up(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        ctx.table("dtb_customer", |t| {
            t.string("email", 255);
            t.unique(&["email"], None);
        })
    }

    fn down(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        ctx.table("dtb_customer", |t| {
            t.drop_index("uniq_dtb_customer_email");
            t.drop_column("email");
        })
    }
}

fn main() -> anyhow::Result<()> {
    let registry = MigrationRegistry::new()
        .with("Version20240101000001_CreateCustomerTable", || {
            CreateCustomerTable
        })?
        .with("Version20240101000002_AddCustomerEmail", || AddCustomerEmail)?;

    let db = DatabaseConn::open_in_memory()?;
    let mut migrator = Migrator::new(Box::new(db), "sqlite3")?.with_registry(registry);

    println!("Dry run:");
    for planned in migrator.plan_apply()? {
        println!("  -- {}", planned.name);
        for sql in &planned.statements {
            println!("  {}", sql);
        }
    }

    let applied = migrator.apply()?;
    println!("\nApplied {} migration(s)", applied.len());

    for status in migrator.status()? {
        println!(
            "  {} {:<8} {}",
            status.version,
            if status.executed { "applied" } else { "pending" },
            status.name
        );
    }

    let reverted = migrator.revert(1)?;
    println!("\nReverted: {:?}", reverted);

    Ok(())
}
