//! Ledger transaction recording and the canonical transaction-type vocabulary.
//!
//! The ledger table accumulated several spellings for "a student paid fees"
//! over the system's life. Every aggregate in this crate (collection totals,
//! last-payment lookups, effectiveness metrics) filters through
//! [`collection_condition`], which matches the whole allow-list rather than a
//! single literal, so legacy rows are never silently undercounted. Voided
//! rows are excluded from every aggregate but are never deleted.

use crate::{
    entities::{LedgerTransaction, Student, ledger_transaction},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    sea_query::{Condition, Expr},
};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Stored spellings that count as a student fee collection, lowercased.
/// Comparison is always case-insensitive.
pub const COLLECTION_SPELLINGS: [&str; 6] = [
    "fee_collection",
    "fees_collection",
    "fee_payment",
    "fees_payment",
    "student_payment",
    "payment",
];

/// Canonical ledger transaction types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    /// A student fee collection (any allow-listed spelling)
    FeeCollection,
    /// Money returned to a student account
    Refund,
    /// Outbound payment (suppliers, payroll); out of scope for collections
    Disbursement,
    /// Manual ledger correction
    Adjustment,
    /// Anything the vocabulary does not recognize
    Other,
}

impl TransactionType {
    /// Normalizes a raw stored spelling, case-insensitively.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if COLLECTION_SPELLINGS.contains(&lowered.as_str()) {
            return Self::FeeCollection;
        }
        match lowered.as_str() {
            "refund" | "fee_refund" => Self::Refund,
            "disbursement" | "supplier_payment" | "payroll" => Self::Disbursement,
            "adjustment" | "correction" => Self::Adjustment,
            _ => Self::Other,
        }
    }

    /// Whether this type counts toward collection aggregates.
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::FeeCollection)
    }

    /// The spelling this crate writes for new rows.
    #[must_use]
    pub const fn canonical(self) -> &'static str {
        match self {
            Self::FeeCollection => "fee_collection",
            Self::Refund => "refund",
            Self::Disbursement => "disbursement",
            Self::Adjustment => "adjustment",
            Self::Other => "other",
        }
    }
}

/// SQL predicate matching non-voided student fee collections under any
/// allow-listed spelling. Every collection aggregate filters through this.
#[must_use]
pub fn collection_condition() -> Condition {
    let in_list = COLLECTION_SPELLINGS
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ");
    Condition::all()
        .add(Expr::cust(format!(
            "LOWER(transaction_type) IN ({in_list})"
        )))
        .add(ledger_transaction::Column::Voided.eq(false))
}

/// Records a student fee collection in the ledger.
///
/// Generic over the connection so the payment-application workflow can record
/// inside its own database transaction.
///
/// # Errors
/// `InvalidAmount` for non-positive or non-finite amounts; `StudentNotFound`
/// when the student does not exist.
pub async fn record_collection<C>(
    db: &C,
    student_id: i64,
    amount: f64,
    transaction_date: NaiveDate,
    reference: Option<String>,
) -> Result<ledger_transaction::Model>
where
    C: ConnectionTrait,
{
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or(Error::StudentNotFound { id: student_id })?;

    let row = ledger_transaction::ActiveModel {
        transaction_type: Set(TransactionType::FeeCollection.canonical().to_string()),
        amount: Set(amount),
        student_id: Set(Some(student_id)),
        transaction_date: Set(transaction_date),
        recorded_at: Set(chrono::Utc::now()),
        reference: Set(reference),
        voided: Set(false),
        ..Default::default()
    };

    let result = row.insert(db).await?;
    info!(
        transaction_id = result.id,
        student_id, amount, "recorded fee collection"
    );
    Ok(result)
}

/// Voids a ledger transaction. The row is flagged, never deleted, so it drops
/// out of every aggregate while remaining for audit.
///
/// # Errors
/// `Validation` when the transaction does not exist.
pub async fn void_transaction(
    db: &sea_orm::DatabaseConnection,
    transaction_id: i64,
) -> Result<ledger_transaction::Model> {
    let row = LedgerTransaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::Validation {
            message: format!("Ledger transaction not found: {transaction_id}"),
        })?;

    let mut active: ledger_transaction::ActiveModel = row.into();
    active.voided = Set(true);
    let result = active.update(db).await?;
    info!(transaction_id, "voided ledger transaction");
    Ok(result)
}

/// Most recent canonical collection date per student, voided rows excluded.
///
/// Returned as a map so aging and reminder rendering can resolve many students
/// in one query instead of one lookup per invoice.
pub async fn last_collection_dates(
    db: &sea_orm::DatabaseConnection,
) -> Result<HashMap<i64, NaiveDate>> {
    let rows: Vec<(i64, NaiveDate)> = LedgerTransaction::find()
        .select_only()
        .column(ledger_transaction::Column::StudentId)
        .column_as(ledger_transaction::Column::TransactionDate.max(), "last_paid")
        .filter(collection_condition())
        .filter(ledger_transaction::Column::StudentId.is_not_null())
        .group_by(ledger_transaction::Column::StudentId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows.into_iter().collect())
}

/// Aggregate collection figures over a calendar-date window (inclusive).
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionTotals {
    /// Number of collection transactions
    pub count: usize,
    /// Sum of collected amounts
    pub total_amount: f64,
    /// Mean collected amount; zero when there were no collections
    pub average_amount: f64,
    /// Distinct students who paid in the window
    pub unique_students: usize,
}

/// Computes collection totals between `from` and `to` inclusive, using the
/// canonical type filter so legacy spellings are counted.
pub async fn collection_totals(
    db: &sea_orm::DatabaseConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<CollectionTotals> {
    let rows = LedgerTransaction::find()
        .filter(collection_condition())
        .filter(ledger_transaction::Column::TransactionDate.between(from, to))
        .all(db)
        .await?;

    let count = rows.len();
    let total_amount: f64 = rows.iter().map(|r| r.amount).sum();
    let unique_students = rows
        .iter()
        .filter_map(|r| r.student_id)
        .collect::<HashSet<_>>()
        .len();
    // Cast safety: transaction counts are far below f64's integer precision.
    #[allow(clippy::cast_precision_loss)]
    let average_amount = if count == 0 {
        0.0
    } else {
        total_amount / count as f64
    };

    Ok(CollectionTotals {
        count,
        total_amount,
        average_amount,
        unique_students,
    })
}
