//! Outstanding-balance normalization - the single source of truth for
//! "what does this invoice still owe" and "does it count as outstanding".
//!
//! The invoice table carries three schema generations of the same financial
//! facts under different column names, and a status vocabulary that drifted
//! along with them. Every downstream reader (payment allocation, aging,
//! priority, effectiveness) composes against the expressions and row-level
//! accessors defined here, so no two reports can ever disagree about which
//! invoices are outstanding or by how much. The column fallback order lives
//! in exactly one place: billed reads `total_amount` then `amount_owed`;
//! paid reads `paid_amount` then `amount_paid` then zero. The bare `amount`
//! column is never consulted - its meaning differs between generations.

use crate::{
    entities::{Invoice, invoice},
    errors::{Error, Result},
};
use sea_orm::{
    EntityTrait, QueryFilter, Select,
    sea_query::{Condition, Expr, SimpleExpr},
};

/// Billed-amount fallback chain, newest schema generation first.
pub const BILLED_SQL: &str = "COALESCE(total_amount, amount_owed)";

/// Paid-amount fallback chain; a missing paid column means nothing paid yet.
pub const PAID_SQL: &str = "COALESCE(paid_amount, amount_paid, 0.0)";

/// Status spellings equivalent to "cancelled", compared case-insensitively.
/// Shared between the SQL predicate and [`InvoiceStatus::from_raw`].
pub const CANCELLED_SPELLINGS: [&str; 4] = ["cancelled", "canceled", "void", "voided"];

fn sql_in_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SQL expression for the canonical outstanding balance of an invoice row,
/// floored at zero. Reusable inside any query over the invoices table.
///
/// Note: cancelled rows are not zeroed here; exclude them with
/// [`outstanding_condition`] (or check status row-side) before summing.
#[must_use]
pub fn outstanding_balance_expr() -> SimpleExpr {
    // SQLite scalar MAX(a, b)
    Expr::cust(format!("MAX({BILLED_SQL} - {PAID_SQL}, 0.0)"))
}

/// SQL predicate for "counts as outstanding".
///
/// Excludes any status equivalent to cancelled/voided (case-insensitively) and
/// any row whose computed balance is zero or negative. Rows with no
/// recognizable billed column are deliberately let through: dropping them here
/// would silently understate receivables, so they surface instead as a
/// [`Error::Consistency`] from [`billed_amount`] when the row is read.
#[must_use]
pub fn outstanding_condition() -> Condition {
    let not_cancelled = format!(
        "LOWER(COALESCE(status, '')) NOT IN ({})",
        sql_in_list(&CANCELLED_SPELLINGS)
    );
    Condition::all().add(Expr::cust(not_cancelled)).add(
        Condition::any()
            .add(Expr::cust(format!("{BILLED_SQL} IS NULL")))
            .add(Expr::cust(format!("{BILLED_SQL} - {PAID_SQL} > 0.0"))),
    )
}

/// SQL expression for ordering invoices oldest-obligation-first: due date,
/// falling back to invoice date, then record creation.
#[must_use]
pub fn due_order_expr() -> SimpleExpr {
    Expr::cust("COALESCE(due_date, invoice_date, created_at)")
}

/// Base query for outstanding invoices. Downstream components add their own
/// filters and ordering on top of this instead of re-deriving the predicate.
#[must_use]
pub fn outstanding_invoices() -> Select<Invoice> {
    Invoice::find().filter(outstanding_condition())
}

/// Canonical invoice status vocabulary.
///
/// Raw stored values are mapped case-insensitively; spellings the system has
/// never used resolve to `Outstanding` and the computed balance decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    /// Billed and unpaid
    Outstanding,
    /// Partially paid
    Partial,
    /// Fully settled
    Paid,
    /// Cancelled or voided; never receivable regardless of stored amounts
    Cancelled,
}

impl InvoiceStatus {
    /// Canonicalizes a raw stored status value.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        let lowered = raw.unwrap_or("").trim().to_lowercase();
        if CANCELLED_SPELLINGS.contains(&lowered.as_str()) {
            return Self::Cancelled;
        }
        match lowered.as_str() {
            "paid" | "settled" | "cleared" => Self::Paid,
            "partial" | "partially_paid" | "part_paid" => Self::Partial,
            _ => Self::Outstanding,
        }
    }

    /// Canonical spelling, as written by this crate.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outstanding => "OUTSTANDING",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Canonical status of an invoice row.
#[must_use]
pub fn status_of(invoice: &invoice::Model) -> InvoiceStatus {
    InvoiceStatus::from_raw(invoice.status.as_deref())
}

/// Billed amount of an invoice row, following the column fallback chain.
///
/// # Errors
/// Returns [`Error::Consistency`] when no recognizable billed column is
/// present; the balance is undefined and must not default to zero.
pub fn billed_amount(invoice: &invoice::Model) -> Result<f64> {
    invoice
        .total_amount
        .or(invoice.amount_owed)
        .ok_or_else(|| Error::Consistency {
            message: format!(
                "invoice {} has no recognizable billed-amount column; cannot compute balance",
                invoice.id
            ),
        })
}

/// Amount paid to date on an invoice row. A row with no paid column from any
/// generation has simply received no payments.
#[must_use]
pub fn paid_to_date(invoice: &invoice::Model) -> f64 {
    invoice.paid_amount.or(invoice.amount_paid).unwrap_or(0.0)
}

/// Canonical outstanding balance: billed minus paid, floored at zero.
/// Cancelled invoices always owe zero regardless of stored amounts.
///
/// # Errors
/// Propagates [`Error::Consistency`] from [`billed_amount`].
pub fn outstanding_balance(invoice: &invoice::Model) -> Result<f64> {
    if status_of(invoice) == InvoiceStatus::Cancelled {
        return Ok(0.0);
    }
    Ok((billed_amount(invoice)? - paid_to_date(invoice)).max(0.0))
}

/// Whether an invoice row counts as outstanding: not cancelled and a positive
/// computed balance.
///
/// # Errors
/// Propagates [`Error::Consistency`] from [`billed_amount`].
pub fn is_outstanding(invoice: &invoice::Model) -> Result<bool> {
    if status_of(invoice) == InvoiceStatus::Cancelled {
        return Ok(false);
    }
    Ok(outstanding_balance(invoice)? > 0.0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::EntityTrait;

    #[test]
    fn test_status_canonicalization_case_insensitive() {
        assert_eq!(
            InvoiceStatus::from_raw(Some("Cancelled")),
            InvoiceStatus::Cancelled
        );
        assert_eq!(
            InvoiceStatus::from_raw(Some("VOIDED")),
            InvoiceStatus::Cancelled
        );
        assert_eq!(
            InvoiceStatus::from_raw(Some("canceled")),
            InvoiceStatus::Cancelled
        );
        assert_eq!(InvoiceStatus::from_raw(Some("PAID")), InvoiceStatus::Paid);
        assert_eq!(
            InvoiceStatus::from_raw(Some("settled")),
            InvoiceStatus::Paid
        );
        assert_eq!(
            InvoiceStatus::from_raw(Some("Partial")),
            InvoiceStatus::Partial
        );
        assert_eq!(
            InvoiceStatus::from_raw(Some("unpaid")),
            InvoiceStatus::Outstanding
        );
        assert_eq!(InvoiceStatus::from_raw(None), InvoiceStatus::Outstanding);
    }

    #[test]
    fn test_billed_amount_prefers_current_generation() {
        let mut invoice = bare_invoice(1, 1);
        invoice.total_amount = Some(17000.0);
        invoice.amount_owed = Some(99.0); // stale legacy value must lose
        assert_eq!(billed_amount(&invoice).unwrap(), 17000.0);

        invoice.total_amount = None;
        assert_eq!(billed_amount(&invoice).unwrap(), 99.0);
    }

    #[test]
    fn test_billed_amount_missing_pair_is_consistency_error() {
        let invoice = bare_invoice(7, 1);
        let result = billed_amount(&invoice);
        assert!(matches!(
            result.unwrap_err(),
            crate::errors::Error::Consistency { message: _ }
        ));
    }

    #[test]
    fn test_outstanding_balance_partial_payment() {
        let mut invoice = bare_invoice(1, 1);
        invoice.total_amount = Some(17000.0);
        invoice.paid_amount = Some(2000.0);
        assert_eq!(outstanding_balance(&invoice).unwrap(), 15000.0);
    }

    #[test]
    fn test_outstanding_balance_floored_at_zero() {
        // Overpaid row must not become a negative bill
        let mut invoice = bare_invoice(1, 1);
        invoice.total_amount = Some(5000.0);
        invoice.paid_amount = Some(6000.0);
        assert_eq!(outstanding_balance(&invoice).unwrap(), 0.0);
        assert!(!is_outstanding(&invoice).unwrap());
    }

    #[test]
    fn test_cancelled_owes_zero_regardless_of_amounts() {
        let mut invoice = bare_invoice(1, 1);
        invoice.total_amount = Some(9000.0);
        invoice.status = Some("cAnCeLlEd".to_string());
        assert_eq!(outstanding_balance(&invoice).unwrap(), 0.0);
        assert!(!is_outstanding(&invoice).unwrap());
    }

    #[test]
    fn test_legacy_generation_pair() {
        let mut invoice = bare_invoice(1, 1);
        invoice.amount_owed = Some(12000.0);
        invoice.amount_paid = Some(4500.0);
        assert_eq!(outstanding_balance(&invoice).unwrap(), 7500.0);
        assert!(is_outstanding(&invoice).unwrap());
    }

    #[tokio::test]
    async fn test_outstanding_predicate_in_query() -> crate::errors::Result<()> {
        let (db, student) = setup_with_student().await?;

        let open = create_test_invoice(&db, student.id, 17000.0, 2000.0, ymd(2026, 3, 1)).await?;
        let legacy =
            create_legacy_invoice(&db, student.id, 8000.0, 0.0, Some(ymd(2026, 2, 1))).await?;
        // Fully paid and cancelled rows must not match
        create_test_invoice(&db, student.id, 5000.0, 5000.0, ymd(2026, 3, 1)).await?;
        let cancelled =
            create_test_invoice(&db, student.id, 9000.0, 0.0, ymd(2026, 3, 1)).await?;
        set_invoice_status(&db, cancelled.id, "Cancelled").await?;

        let rows = outstanding_invoices().all(&db).await?;
        let mut ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![open.id, legacy.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_predicate_keeps_unrecognizable_rows_visible() -> crate::errors::Result<()> {
        // A row with no billed column must not vanish from the outstanding set;
        // it has to surface as an error when its balance is read.
        let (db, student) = setup_with_student().await?;
        let malformed = crate::entities::invoice::ActiveModel {
            student_id: sea_orm::Set(student.id),
            term: sea_orm::Set("2026-T1".to_string()),
            status: sea_orm::Set(Some("OUTSTANDING".to_string())),
            created_at: sea_orm::Set(chrono::Utc::now()),
            ..Default::default()
        };
        let malformed = sea_orm::ActiveModelTrait::insert(malformed, &db).await?;

        let rows = outstanding_invoices().all(&db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, malformed.id);
        assert!(outstanding_balance(&rows[0]).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_balance_expr_matches_row_side_computation() -> crate::errors::Result<()> {
        use sea_orm::{FromQueryResult, QuerySelect};

        #[derive(Debug, FromQueryResult)]
        struct Row {
            outstanding: f64,
        }

        let (db, student) = setup_with_student().await?;
        let invoice =
            create_test_invoice(&db, student.id, 17000.0, 2000.0, ymd(2026, 3, 1)).await?;

        let row = crate::entities::Invoice::find_by_id(invoice.id)
            .select_only()
            .column_as(outstanding_balance_expr(), "outstanding")
            .into_model::<Row>()
            .one(&db)
            .await?
            .unwrap();

        assert_eq!(row.outstanding, outstanding_balance(&invoice)?);
        assert_eq!(row.outstanding, 15000.0);
        Ok(())
    }
}
