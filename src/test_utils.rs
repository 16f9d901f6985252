//! Shared test utilities.
//!
//! Common helpers for setting up in-memory test databases and creating test
//! rows with sensible defaults, including rows shaped like each historical
//! schema generation.

use crate::{
    config::database::create_tables,
    entities::{self, invoice, ledger_transaction, student},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for building calendar dates in tests.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a test student with a zero credit balance.
pub async fn create_test_student(
    db: &DatabaseConnection,
    name: &str,
    admission_number: &str,
) -> Result<student::Model> {
    let model = student::ActiveModel {
        name: Set(name.to_string()),
        admission_number: Set(admission_number.to_string()),
        guardian_phone: Set(None),
        credit_balance: Set(0.0),
        is_active: Set(true),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Sets up a database with a single student.
/// Returns (db, student) for common test scenarios.
pub async fn setup_with_student() -> Result<(DatabaseConnection, student::Model)> {
    let db = setup_test_db().await?;
    let student = create_test_student(&db, "Test Student", "ADM-000").await?;
    Ok((db, student))
}

/// Creates a current-generation invoice (`total_amount`/`paid_amount`) with
/// status `"OUTSTANDING"`; the invoice date matches the due date.
pub async fn create_test_invoice(
    db: &DatabaseConnection,
    student_id: i64,
    billed: f64,
    paid: f64,
    due_date: NaiveDate,
) -> Result<invoice::Model> {
    let model = invoice::ActiveModel {
        student_id: Set(student_id),
        term: Set("2026-T1".to_string()),
        status: Set(Some("OUTSTANDING".to_string())),
        due_date: Set(Some(due_date)),
        invoice_date: Set(Some(due_date)),
        created_at: Set(chrono::Utc::now()),
        total_amount: Set(Some(billed)),
        paid_amount: Set(Some(paid)),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates a previous-generation invoice (`amount_owed`/`amount_paid`) with a
/// legacy status spelling, as older system versions wrote them.
pub async fn create_legacy_invoice(
    db: &DatabaseConnection,
    student_id: i64,
    billed: f64,
    paid: f64,
    due_date: Option<NaiveDate>,
) -> Result<invoice::Model> {
    let model = invoice::ActiveModel {
        student_id: Set(student_id),
        term: Set("2024-T2".to_string()),
        status: Set(Some("unpaid".to_string())),
        due_date: Set(due_date),
        invoice_date: Set(due_date),
        created_at: Set(chrono::Utc::now()),
        amount_owed: Set(Some(billed)),
        amount_paid: Set(Some(paid)),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Overwrites an invoice's raw stored status.
pub async fn set_invoice_status(
    db: &DatabaseConnection,
    invoice_id: i64,
    status: &str,
) -> Result<invoice::Model> {
    let mut active: invoice::ActiveModel = find_invoice(db, invoice_id).await?.into();
    active.status = Set(Some(status.to_string()));
    active.update(db).await.map_err(Into::into)
}

/// Overwrites an invoice's due and invoice dates.
pub async fn set_invoice_dates(
    db: &DatabaseConnection,
    invoice_id: i64,
    due_date: Option<NaiveDate>,
    invoice_date: Option<NaiveDate>,
) -> Result<invoice::Model> {
    let mut active: invoice::ActiveModel = find_invoice(db, invoice_id).await?.into();
    active.due_date = Set(due_date);
    active.invoice_date = Set(invoice_date);
    active.update(db).await.map_err(Into::into)
}

/// Fetches an invoice by id, failing the test when it is missing.
pub async fn find_invoice(db: &DatabaseConnection, invoice_id: i64) -> Result<invoice::Model> {
    entities::Invoice::find_by_id(invoice_id)
        .one(db)
        .await?
        .ok_or(Error::InvoiceNotFound { id: invoice_id })
}

/// Inserts a ledger row with an arbitrary raw type spelling, the way legacy
/// system generations wrote them.
pub async fn insert_raw_ledger_row(
    db: &DatabaseConnection,
    student_id: Option<i64>,
    transaction_type: &str,
    amount: f64,
    transaction_date: NaiveDate,
) -> Result<ledger_transaction::Model> {
    let model = ledger_transaction::ActiveModel {
        transaction_type: Set(transaction_type.to_string()),
        amount: Set(amount),
        student_id: Set(student_id),
        transaction_date: Set(transaction_date),
        recorded_at: Set(chrono::Utc::now()),
        reference: Set(None),
        voided: Set(false),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Builds an in-memory invoice model with every amount column empty, for
/// unit tests that exercise normalization without a database.
#[must_use]
pub fn bare_invoice(id: i64, student_id: i64) -> invoice::Model {
    invoice::Model {
        id,
        student_id,
        term: "2026-T1".to_string(),
        status: Some("OUTSTANDING".to_string()),
        due_date: None,
        invoice_date: None,
        created_at: chrono::Utc::now(),
        total_amount: None,
        paid_amount: None,
        amount_owed: None,
        amount_paid: None,
        amount: None,
    }
}
