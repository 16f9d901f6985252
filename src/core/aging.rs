//! Aged-receivables calculation - bucketing outstanding invoices by days
//! overdue as of a reference date.
//!
//! Derived on every call, never persisted. Every invoice lands in exactly one
//! of five fixed windows, while a student is counted toward `student_count`
//! only on the first of their invoices processed; the same student's amounts
//! may therefore spread across several buckets. The dedup is an ordinary
//! accumulator over the invoice loop, keyed by student id.

use crate::{
    core::{ledger, normalizer},
    entities::{invoice, student},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, Order, QueryFilter, QueryOrder};
use std::collections::HashSet;

/// The five fixed aging windows. `max_days` of `None` means unbounded (120+).
#[derive(Debug, Clone, Copy)]
pub struct BucketDef {
    /// Display name of the window
    pub name: &'static str,
    /// Compact day-range label, as printed in the CSV export
    pub range_label: &'static str,
    /// Lower bound in days overdue (inclusive)
    pub min_days: i64,
    /// Upper bound in days overdue (inclusive); `None` for the open tail
    pub max_days: Option<i64>,
}

/// Fixed bucket windows shared by the report and the CSV export.
pub const BUCKETS: [BucketDef; 5] = [
    BucketDef {
        name: "0-30 Days",
        range_label: "0-30",
        min_days: 0,
        max_days: Some(30),
    },
    BucketDef {
        name: "31-60 Days",
        range_label: "31-60",
        min_days: 31,
        max_days: Some(60),
    },
    BucketDef {
        name: "61-90 Days",
        range_label: "61-90",
        min_days: 61,
        max_days: Some(90),
    },
    BucketDef {
        name: "91-120 Days",
        range_label: "91-120",
        min_days: 91,
        max_days: Some(120),
    },
    BucketDef {
        name: "120+ Days",
        range_label: "120+",
        min_days: 121,
        max_days: None,
    },
];

/// Index of the bucket a days-overdue value falls into.
#[must_use]
pub const fn bucket_index(days_overdue: i64) -> usize {
    match days_overdue {
        i64::MIN..=30 => 0,
        31..=60 => 1,
        61..=90 => 2,
        91..=120 => 3,
        _ => 4,
    }
}

/// One account line inside a bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    /// Student identifier
    pub student_id: i64,
    /// Student name as printed on the report
    pub student_name: String,
    /// School admission number
    pub admission_number: String,
    /// Normalized outstanding amount of this invoice
    pub amount: f64,
    /// Whole days overdue as of the reference date
    pub days_overdue: i64,
    /// Most recent canonical collection date, if any payment is on record
    pub last_payment_date: Option<NaiveDate>,
}

impl AccountRow {
    /// Display form of the last payment date; absence is an explicit marker,
    /// never an empty cell.
    #[must_use]
    pub fn last_payment_label(&self) -> String {
        self.last_payment_date
            .map_or_else(|| "no payment on record".to_string(), |d| d.to_string())
    }
}

/// One aged-receivable bucket as of a reference date.
#[derive(Debug, Clone)]
pub struct AgedReceivableBucket {
    /// The window this bucket covers
    pub def: BucketDef,
    /// Distinct students first seen in this bucket
    pub student_count: usize,
    /// Total outstanding amount of the invoices in this bucket
    pub total_amount: f64,
    /// One row per invoice
    pub accounts: Vec<AccountRow>,
}

/// Full aging report: five buckets plus overall totals.
#[derive(Debug, Clone)]
pub struct AgingReport {
    /// Reference date the ages were computed against
    pub as_of: NaiveDate,
    /// The five buckets in window order
    pub buckets: Vec<AgedReceivableBucket>,
    /// Total outstanding invoices included
    pub total_outstanding_invoices: usize,
    /// Sum of outstanding amounts across all buckets
    pub total_outstanding_amount: f64,
}

/// Computes the aged-receivables report as of `as_of`.
///
/// Includes every outstanding invoice (per the normalizer's predicate) whose
/// due date is on or before `as_of`. Invoices without a due date cannot be
/// aged and are excluded here; they still appear in payment allocation and
/// outstanding totals.
///
/// # Errors
/// Propagates `Consistency` errors from balance normalization - an invoice
/// that cannot be normalized fails the whole report rather than silently
/// understating receivables - and `StudentNotFound` for orphaned invoices.
pub async fn calculate_aged_receivables(
    db: &DatabaseConnection,
    as_of: NaiveDate,
) -> Result<AgingReport> {
    let rows = normalizer::outstanding_invoices()
        .filter(invoice::Column::DueDate.is_not_null())
        .filter(invoice::Column::DueDate.lte(as_of))
        .order_by(normalizer::due_order_expr(), Order::Asc)
        .find_also_related(crate::entities::Student)
        .all(db)
        .await?;

    let last_payments = ledger::last_collection_dates(db).await?;

    let mut buckets: Vec<AgedReceivableBucket> = BUCKETS
        .iter()
        .map(|def| AgedReceivableBucket {
            def: *def,
            student_count: 0,
            total_amount: 0.0,
            accounts: Vec::new(),
        })
        .collect();

    let mut seen_students: HashSet<i64> = HashSet::new();
    let mut total_invoices = 0;
    let mut total_amount = 0.0;

    for (inv, maybe_student) in rows {
        let student: student::Model = maybe_student.ok_or(Error::StudentNotFound {
            id: inv.student_id,
        })?;
        let amount = normalizer::outstanding_balance(&inv)?;
        if amount <= 0.0 {
            continue;
        }
        // The query already constrained due_date to be present
        let due = inv.due_date.ok_or_else(|| Error::Consistency {
            message: format!("invoice {} lost its due date mid-query", inv.id),
        })?;
        let days_overdue = (as_of - due).num_days();

        let bucket = &mut buckets[bucket_index(days_overdue)];
        bucket.total_amount += amount;
        // A student is counted once, in whichever bucket their first-processed
        // invoice lands; their other invoices still add amounts to their own
        // buckets.
        if seen_students.insert(student.id) {
            bucket.student_count += 1;
        }
        bucket.accounts.push(AccountRow {
            student_id: student.id,
            student_name: student.name.clone(),
            admission_number: student.admission_number.clone(),
            amount,
            days_overdue,
            last_payment_date: last_payments.get(&student.id).copied(),
        });

        total_invoices += 1;
        total_amount += amount;
    }

    Ok(AgingReport {
        as_of,
        buckets,
        total_outstanding_invoices: total_invoices,
        total_outstanding_amount: total_amount,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_bucket_index_boundaries() {
        assert_eq!(bucket_index(0), 0);
        assert_eq!(bucket_index(30), 0);
        assert_eq!(bucket_index(31), 1);
        assert_eq!(bucket_index(60), 1);
        assert_eq!(bucket_index(61), 2);
        assert_eq!(bucket_index(90), 2);
        assert_eq!(bucket_index(91), 3);
        assert_eq!(bucket_index(120), 3);
        assert_eq!(bucket_index(121), 4);
        assert_eq!(bucket_index(500), 4);
    }

    #[tokio::test]
    async fn test_ten_days_overdue_lands_in_first_bucket() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let as_of = ymd(2026, 3, 11);
        create_test_invoice(&db, student.id, 17000.0, 2000.0, ymd(2026, 3, 1)).await?;

        let report = calculate_aged_receivables(&db, as_of).await?;
        assert_eq!(report.buckets[0].accounts.len(), 1);
        assert_eq!(report.buckets[0].accounts[0].amount, 15000.0);
        assert_eq!(report.buckets[0].accounts[0].days_overdue, 10);
        assert_eq!(report.buckets[0].total_amount, 15000.0);
        assert_eq!(report.total_outstanding_amount, 15000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_invoices_excluded_entirely() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        let cancelled =
            create_test_invoice(&db, student.id, 9000.0, 0.0, ymd(2026, 1, 1)).await?;
        set_invoice_status(&db, cancelled.id, "CANCELLED").await?;

        let report = calculate_aged_receivables(&db, ymd(2026, 3, 1)).await?;
        assert_eq!(report.total_outstanding_invoices, 0);
        assert_eq!(report.total_outstanding_amount, 0.0);
        assert!(report.buckets.iter().all(|b| b.accounts.is_empty()));
        Ok(())
    }

    #[tokio::test]
    async fn test_student_counted_once_but_amounts_spread() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_student(&db, "Asha Mwangi", "ADM-001").await?;
        let b = create_test_student(&db, "Brian Otieno", "ADM-002").await?;
        let as_of = ymd(2026, 6, 1);

        // Student A: one invoice 10 days overdue, one 100 days overdue
        create_test_invoice(&db, a.id, 5000.0, 0.0, ymd(2026, 5, 22)).await?;
        create_test_invoice(&db, a.id, 7000.0, 0.0, ymd(2026, 2, 21)).await?;
        // Student B: one invoice 45 days overdue
        create_test_invoice(&db, b.id, 3000.0, 0.0, ymd(2026, 4, 17)).await?;

        let report = calculate_aged_receivables(&db, as_of).await?;

        // Student A's first-processed invoice is the oldest (100 days), so the
        // count lands in 91-120; both of A's invoices still carry amounts.
        let counts: Vec<usize> = report.buckets.iter().map(|bk| bk.student_count).collect();
        assert_eq!(counts.iter().sum::<usize>(), 2);
        assert_eq!(report.buckets[3].student_count, 1);
        assert_eq!(report.buckets[1].student_count, 1);

        assert_eq!(report.buckets[0].total_amount, 5000.0);
        assert_eq!(report.buckets[1].total_amount, 3000.0);
        assert_eq!(report.buckets[3].total_amount, 7000.0);

        // Property: bucket totals sum to the normalized outstanding total
        let bucket_sum: f64 = report.buckets.iter().map(|bk| bk.total_amount).sum();
        assert_eq!(bucket_sum, report.total_outstanding_amount);
        assert_eq!(bucket_sum, 15000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_future_due_dates_excluded() -> Result<()> {
        let (db, student) = setup_with_student().await?;
        create_test_invoice(&db, student.id, 5000.0, 0.0, ymd(2026, 4, 1)).await?;

        let report = calculate_aged_receivables(&db, ymd(2026, 3, 1)).await?;
        assert_eq!(report.total_outstanding_invoices, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_last_payment_marker_when_no_history() -> Result<()> {
        let db = setup_test_db().await?;
        let paid_once = create_test_student(&db, "Paid Once", "ADM-010").await?;
        let never_paid = create_test_student(&db, "Never Paid", "ADM-011").await?;

        create_test_invoice(&db, paid_once.id, 4000.0, 1000.0, ymd(2026, 2, 1)).await?;
        create_test_invoice(&db, never_paid.id, 4000.0, 0.0, ymd(2026, 2, 1)).await?;
        crate::core::ledger::record_collection(&db, paid_once.id, 1000.0, ymd(2026, 2, 15), None)
            .await?;

        let report = calculate_aged_receivables(&db, ymd(2026, 3, 1)).await?;
        let rows = &report.buckets[0].accounts;
        assert_eq!(rows.len(), 2);

        let paid_row = rows.iter().find(|r| r.student_id == paid_once.id).unwrap();
        assert_eq!(paid_row.last_payment_date, Some(ymd(2026, 2, 15)));
        assert_eq!(paid_row.last_payment_label(), "2026-02-15");

        let unpaid_row = rows.iter().find(|r| r.student_id == never_paid.id).unwrap();
        assert_eq!(unpaid_row.last_payment_date, None);
        assert_eq!(unpaid_row.last_payment_label(), "no payment on record");
        Ok(())
    }

    #[tokio::test]
    async fn test_bucket_sum_equals_outstanding_sum() -> Result<()> {
        let db = setup_test_db().await?;
        let as_of = ymd(2026, 6, 1);
        for (i, (billed, paid, due)) in [
            (17000.0, 2000.0, ymd(2026, 5, 22)),
            (9000.0, 0.0, ymd(2026, 3, 1)),
            (4500.0, 4500.0, ymd(2026, 2, 1)), // settled, contributes nothing
            (12000.0, 500.0, ymd(2025, 11, 1)),
        ]
        .into_iter()
        .enumerate()
        {
            let s =
                create_test_student(&db, &format!("Student {i}"), &format!("ADM-10{i}")).await?;
            create_test_invoice(&db, s.id, billed, paid, due).await?;
        }

        let report = calculate_aged_receivables(&db, as_of).await?;
        let bucket_sum: f64 = report.buckets.iter().map(|bk| bk.total_amount).sum();
        assert_eq!(bucket_sum, 15000.0 + 9000.0 + 11500.0);
        assert_eq!(report.total_outstanding_amount, bucket_sum);
        assert_eq!(report.total_outstanding_invoices, 3);
        Ok(())
    }
}
