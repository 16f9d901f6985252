//! Collections effectiveness - billed-versus-collected over a trailing
//! three-month window, banded into a dashboard status.

use crate::{
    core::{ledger, normalizer},
    errors::{Error, Result},
};
use chrono::{Months, NaiveDate};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::collections::HashSet;

/// Coarse banding of the collection rate for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectivenessStatus {
    /// Rate >= 80
    Excellent,
    /// Rate >= 60
    Good,
    /// Rate >= 40
    Fair,
    /// Anything below
    Poor,
}

impl EffectivenessStatus {
    /// Band for a collection rate in percent.
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            Self::Excellent
        } else if rate >= 60.0 {
            Self::Good
        } else if rate >= 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Display spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
        }
    }
}

/// Billed-versus-collected report over the trailing window.
#[derive(Debug, Clone)]
pub struct EffectivenessReport {
    /// Start of the trailing window (inclusive)
    pub window_start: NaiveDate,
    /// End of the trailing window (inclusive)
    pub window_end: NaiveDate,
    /// Canonical collection aggregates inside the window
    pub collections: ledger::CollectionTotals,
    /// Outstanding invoices right now, unbounded by date
    pub outstanding_invoice_count: usize,
    /// Total outstanding amount right now
    pub outstanding_amount: f64,
    /// Distinct students currently in arrears
    pub students_in_arrears: usize,
    /// Total billed inside the window, cancelled invoices excluded
    pub billed_amount: f64,
    /// Collected / billed x 100, clamped to [0, 100]; 0 when nothing billed
    pub collection_rate: f64,
    /// Dashboard banding of the rate
    pub status: EffectivenessStatus,
}

fn effective_issue_date(inv: &crate::entities::invoice::Model) -> NaiveDate {
    inv.invoice_date.unwrap_or_else(|| inv.created_at.date_naive())
}

/// Computes the collections effectiveness report for the three months ending
/// at `as_of`.
///
/// # Errors
/// `Consistency` when the window start cannot be represented, or when an
/// invoice's amounts cannot be normalized.
pub async fn get_collections_effectiveness_report(
    db: &DatabaseConnection,
    as_of: NaiveDate,
) -> Result<EffectivenessReport> {
    let window_start = as_of
        .checked_sub_months(Months::new(3))
        .ok_or_else(|| Error::Consistency {
            message: format!("cannot compute trailing window start from {as_of}"),
        })?;

    let collections = ledger::collection_totals(db, window_start, as_of).await?;

    // Outstanding snapshot: unbounded by date, normalizer predicate only
    let outstanding = normalizer::outstanding_invoices().all(db).await?;
    let mut outstanding_amount = 0.0;
    let mut arrears_students = HashSet::new();
    for inv in &outstanding {
        outstanding_amount += normalizer::outstanding_balance(inv)?;
        arrears_students.insert(inv.student_id);
    }

    // Billed inside the window: everything invoiced in the period except
    // cancelled rows, read through the same column fallback as every balance
    let all_invoices = crate::entities::Invoice::find().all(db).await?;
    let mut billed_amount = 0.0;
    for inv in &all_invoices {
        if normalizer::status_of(inv) == normalizer::InvoiceStatus::Cancelled {
            continue;
        }
        let issued = effective_issue_date(inv);
        if issued >= window_start && issued <= as_of {
            billed_amount += normalizer::billed_amount(inv)?;
        }
    }

    let collection_rate = if billed_amount <= 0.0 {
        0.0
    } else {
        (collections.total_amount / billed_amount * 100.0).clamp(0.0, 100.0)
    };

    Ok(EffectivenessReport {
        window_start,
        window_end: as_of,
        collections,
        outstanding_invoice_count: outstanding.len(),
        outstanding_amount,
        students_in_arrears: arrears_students.len(),
        billed_amount,
        collection_rate,
        status: EffectivenessStatus::from_rate(collection_rate),
    })
}
