//! Reporting facade - composes the aging, priority, and effectiveness views
//! and renders the CSV export. Nothing here re-derives normalization logic;
//! it all flows through the underlying components.

use crate::{
    core::{
        aging::{self, AccountRow, AgingReport},
        effectiveness::{self, EffectivenessReport},
        priority::{self, HighPriorityInvoice},
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Fixed header of the aged-receivables CSV export.
pub const CSV_HEADER: &str =
    "Bucket,Days Overdue,Student Count,Total Amount,Student Name,Admission #,Amount,Last Payment";

/// Everything the collections dashboard shows, computed against one date.
#[derive(Debug, Clone)]
pub struct DashboardReport {
    /// Full aged-receivables breakdown
    pub aging: AgingReport,
    /// Ranked high-priority list
    pub high_priority: Vec<HighPriorityInvoice>,
    /// Billed-versus-collected effectiveness
    pub effectiveness: EffectivenessReport,
}

/// Composes the full collections dashboard as of `as_of`.
///
/// The reminder batch is deliberately not part of this view: generating
/// reminders persists `CollectionAction` rows, and the dashboard must stay
/// read-only. The daily job invokes
/// [`crate::core::reminders::generate_collection_reminders`] separately.
///
/// # Errors
/// Propagates errors from any of the composed reports.
pub async fn full_collections_report(
    db: &DatabaseConnection,
    as_of: NaiveDate,
) -> Result<DashboardReport> {
    Ok(DashboardReport {
        aging: aging::calculate_aged_receivables(db, as_of).await?,
        high_priority: priority::get_high_priority_collections(db, as_of).await?,
        effectiveness: effectiveness::get_collections_effectiveness_report(db, as_of).await?,
    })
}

/// The top `n` overdue account rows across all buckets, largest amount first.
///
/// # Errors
/// Propagates errors from the aging calculation.
pub async fn top_overdue_accounts(
    db: &DatabaseConnection,
    as_of: NaiveDate,
    n: usize,
) -> Result<Vec<AccountRow>> {
    let report = aging::calculate_aged_receivables(db, as_of).await?;
    let mut rows: Vec<AccountRow> = report
        .buckets
        .into_iter()
        .flat_map(|bucket| bucket.accounts)
        .collect();
    rows.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows.truncate(n);
    Ok(rows)
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Renders the aged-receivables report as CSV: the fixed header, then one row
/// per account per bucket. `as_of` defaults to today.
///
/// # Errors
/// Propagates errors from the aging calculation.
pub async fn export_aged_receivables_csv(
    db: &DatabaseConnection,
    as_of: Option<NaiveDate>,
) -> Result<String> {
    let as_of = as_of.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let report = aging::calculate_aged_receivables(db, as_of).await?;

    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for bucket in &report.buckets {
        for account in &bucket.accounts {
            out.push_str(&format!(
                "{},{},{},{:.2},{},{},{:.2},{}\n",
                csv_field(bucket.def.name),
                bucket.def.range_label,
                bucket.student_count,
                bucket.total_amount,
                csv_field(&account.student_name),
                csv_field(&account.admission_number),
                account.amount,
                csv_field(&account.last_payment_label()),
            ));
        }
    }
    Ok(out)
}
