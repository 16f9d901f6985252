//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables
//! are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Creation is idempotent: the daily job
//! runs against an existing database.

use crate::entities::{CollectionAction, Invoice, LedgerTransaction, Student};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the environment or returns the default
/// `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/bursar.sqlite".to_string())
}

/// Establishes a connection using `DATABASE_URL`, falling back to a local
/// `SQLite` file.
///
/// # Errors
/// Returns a `Database` error when the connection cannot be established.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions. Safe to call on an
/// existing database.
///
/// # Errors
/// Returns a `Database` error when a statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut student_table = schema.create_table_from_entity(Student);
    student_table.if_not_exists();
    let mut invoice_table = schema.create_table_from_entity(Invoice);
    invoice_table.if_not_exists();
    let mut ledger_table = schema.create_table_from_entity(LedgerTransaction);
    ledger_table.if_not_exists();
    let mut action_table = schema.create_table_from_entity(CollectionAction);
    action_table.if_not_exists();

    db.execute(builder.build(&student_table)).await?;
    db.execute(builder.build(&invoice_table)).await?;
    db.execute(builder.build(&ledger_table)).await?;
    db.execute(builder.build(&action_table)).await?;

    Ok(())
}
