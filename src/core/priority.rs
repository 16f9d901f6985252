//! High-priority collections - the ranked list a bursar chases first.
//!
//! An outstanding invoice is high priority when it is more than 90 days
//! overdue or its outstanding amount exceeds the large-amount threshold.
//! The list is ranked by amount descending and capped; a student with two
//! qualifying invoices appears twice.

use crate::{
    core::normalizer,
    entities::{invoice, student},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, Order, QueryOrder};

/// Days overdue beyond which an invoice is chased regardless of size.
pub const HIGH_PRIORITY_DAYS: i64 = 90;

/// Outstanding amount above which an invoice is chased regardless of age.
pub const HIGH_PRIORITY_AMOUNT: f64 = 100_000.0;

/// Maximum entries returned.
pub const MAX_HIGH_PRIORITY: usize = 50;

/// One entry on the high-priority list.
#[derive(Debug, Clone)]
pub struct HighPriorityInvoice {
    /// The underlying invoice row
    pub invoice: invoice::Model,
    /// Student name for display
    pub student_name: String,
    /// School admission number for display
    pub admission_number: String,
    /// Normalized outstanding amount
    pub outstanding: f64,
    /// Whole days overdue as of the reference date
    pub days_overdue: i64,
}

fn effective_due_date(inv: &invoice::Model) -> NaiveDate {
    inv.due_date
        .or(inv.invoice_date)
        .unwrap_or_else(|| inv.created_at.date_naive())
}

/// Returns up to [`MAX_HIGH_PRIORITY`] outstanding invoices that are either
/// more than [`HIGH_PRIORITY_DAYS`] days overdue or larger than
/// [`HIGH_PRIORITY_AMOUNT`], ranked by outstanding amount descending.
///
/// # Errors
/// Propagates `Consistency` errors from balance normalization and
/// `StudentNotFound` for orphaned invoices.
pub async fn get_high_priority_collections(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<HighPriorityInvoice>> {
    let rows = normalizer::outstanding_invoices()
        .order_by(normalizer::due_order_expr(), Order::Asc)
        .find_also_related(crate::entities::Student)
        .all(db)
        .await?;

    let mut entries = Vec::new();
    for (inv, maybe_student) in rows {
        let student: student::Model = maybe_student.ok_or(Error::StudentNotFound {
            id: inv.student_id,
        })?;
        let outstanding = normalizer::outstanding_balance(&inv)?;
        if outstanding <= 0.0 {
            continue;
        }
        let days_overdue = (today - effective_due_date(&inv)).num_days();

        if days_overdue > HIGH_PRIORITY_DAYS || outstanding > HIGH_PRIORITY_AMOUNT {
            entries.push(HighPriorityInvoice {
                student_name: student.name,
                admission_number: student.admission_number,
                outstanding,
                days_overdue,
                invoice: inv,
            });
        }
    }

    entries.sort_by(|a, b| {
        b.outstanding
            .partial_cmp(&a.outstanding)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries.truncate(MAX_HIGH_PRIORITY);
    Ok(entries)
}
