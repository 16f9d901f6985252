//! Payment allocation - validating a tendered amount against a student's
//! outstanding invoices and applying it oldest-obligation-first.
//!
//! `validate_payment` is read-only: it reports which invoices a payment would
//! cover and whether any excess becomes a credit. `apply_payment` performs the
//! actual application as one database transaction - every invoice update, the
//! credit adjustment, and the ledger record commit together or not at all, so
//! a concurrent report never observes a half-applied allocation. Both walk
//! invoices in the same order (due date, then invoice date, then creation),
//! so what validation reports is exactly what application does.

use crate::{
    core::{ledger, normalizer},
    entities::{Student, invoice, ledger_transaction, student},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};
use tracing::info;

/// Result of validating a tendered payment against a student's account.
#[derive(Debug, Clone)]
pub struct PaymentValidation {
    /// Whether the payment can proceed
    pub valid: bool,
    /// Human-readable outcome for the cashier
    pub message: String,
    /// Outstanding invoices the payment will be applied against, oldest first
    pub invoices: Vec<invoice::Model>,
}

/// One slice of an applied payment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPortion {
    /// Invoice that received the slice
    pub invoice_id: i64,
    /// Amount applied to it
    pub amount: f64,
}

/// Outcome of an applied payment.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    /// The ledger transaction recorded for the full tendered amount
    pub transaction: ledger_transaction::Model,
    /// Per-invoice allocation, oldest obligation first
    pub applied: Vec<AppliedPortion>,
    /// Excess credited to the student's account
    pub credited: f64,
}

/// Fetches a student's outstanding invoices ordered oldest-obligation-first:
/// due date, falling back to invoice date, then record creation.
pub async fn outstanding_invoices_for_student<C>(
    db: &C,
    student_id: i64,
) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    normalizer::outstanding_invoices()
        .filter(invoice::Column::StudentId.eq(student_id))
        .order_by(normalizer::due_order_expr(), Order::Asc)
        .all(db)
        .await
        .map_err(Into::into)
}

fn invoices_covered(invoices: &[invoice::Model], amount: f64) -> Result<usize> {
    let mut remaining = amount;
    let mut covered = 0;
    for inv in invoices {
        if remaining <= 0.0 {
            break;
        }
        remaining -= normalizer::outstanding_balance(inv)?;
        covered += 1;
    }
    Ok(covered)
}

/// Validates a tendered payment against a student's outstanding invoices.
///
/// No outstanding invoices is not an error: the payment is valid and will be
/// recorded as a credit. Overpayment is likewise valid; the excess is reported
/// in the message and credited by [`apply_payment`].
///
/// # Errors
/// `InvalidAmount` for non-positive or non-finite amounts; `StudentNotFound`
/// when the student does not exist; `Consistency` when an invoice's balance
/// cannot be normalized.
pub async fn validate_payment(
    db: &DatabaseConnection,
    student_id: i64,
    amount: f64,
) -> Result<PaymentValidation> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    let student = Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or(Error::StudentNotFound { id: student_id })?;

    let invoices = outstanding_invoices_for_student(db, student_id).await?;

    if invoices.is_empty() {
        return Ok(PaymentValidation {
            valid: true,
            message: format!(
                "{} has no outstanding invoices; the full {amount:.2} will be credited to the account.",
                student.name
            ),
            invoices,
        });
    }

    let total_outstanding: f64 = invoices
        .iter()
        .map(normalizer::outstanding_balance)
        .sum::<Result<f64>>()?;

    let message = if amount > total_outstanding {
        let excess = amount - total_outstanding;
        format!(
            "Payment exceeds total outstanding of {total_outstanding:.2}; the excess {excess:.2} will be credited to the account."
        )
    } else {
        let covered = invoices_covered(&invoices, amount)?;
        format!(
            "Payment of {amount:.2} will be applied to {covered} of {} outstanding invoice(s), oldest first.",
            invoices.len()
        )
    };

    Ok(PaymentValidation {
        valid: true,
        message,
        invoices,
    })
}

/// Credits a student's account balance atomically:
/// `UPDATE students SET credit_balance = credit_balance + delta WHERE id = ?`.
async fn credit_student_balance<C>(db: &C, student_id: i64, delta: f64) -> Result<()>
where
    C: ConnectionTrait,
{
    Student::update_many()
        .col_expr(
            student::Column::CreditBalance,
            Expr::col(student::Column::CreditBalance).add(delta),
        )
        .filter(student::Column::Id.eq(student_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Applies a tendered payment to a student's account as one atomic unit.
///
/// Walks outstanding invoices oldest-first, raising the generation-appropriate
/// paid column on each and re-deriving its status; any excess is credited to
/// the student; the collection is recorded in the ledger. All of it commits
/// together or rolls back together.
///
/// # Errors
/// Same validation errors as [`validate_payment`], plus any database failure,
/// which rolls back the whole application.
pub async fn apply_payment(
    db: &DatabaseConnection,
    student_id: i64,
    amount: f64,
    payment_date: NaiveDate,
    reference: Option<String>,
) -> Result<PaymentReceipt> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    Student::find_by_id(student_id)
        .one(&txn)
        .await?
        .ok_or(Error::StudentNotFound { id: student_id })?;

    // Re-fetch inside the transaction so the allocation works off a stable view
    let invoices = outstanding_invoices_for_student(&txn, student_id).await?;

    let mut remaining = amount;
    let mut applied = Vec::new();

    for inv in invoices {
        if remaining <= 0.0 {
            break;
        }
        let balance = normalizer::outstanding_balance(&inv)?;
        let portion = balance.min(remaining);
        remaining -= portion;

        let new_paid = normalizer::paid_to_date(&inv) + portion;
        let settled = new_paid >= normalizer::billed_amount(&inv)?;
        let invoice_id = inv.id;
        let current_generation = inv.total_amount.is_some();

        let mut active: invoice::ActiveModel = inv.into();
        // Write the paid column belonging to the row's own schema generation
        if current_generation {
            active.paid_amount = Set(Some(new_paid));
        } else {
            active.amount_paid = Set(Some(new_paid));
        }
        active.status = Set(Some(
            if settled {
                normalizer::InvoiceStatus::Paid
            } else {
                normalizer::InvoiceStatus::Partial
            }
            .as_str()
            .to_string(),
        ));
        active.update(&txn).await?;

        applied.push(AppliedPortion {
            invoice_id,
            amount: portion,
        });
    }

    let credited = remaining;
    if credited > 0.0 {
        credit_student_balance(&txn, student_id, credited).await?;
    }

    let transaction =
        ledger::record_collection(&txn, student_id, amount, payment_date, reference).await?;

    txn.commit().await?;

    info!(
        student_id,
        amount,
        invoices_touched = applied.len(),
        credited,
        "applied payment"
    );

    Ok(PaymentReceipt {
        transaction,
        applied,
        credited,
    })
}
