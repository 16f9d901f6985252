//! Daily collections job.
//!
//! The external scheduler runs this once per day: it generates the exact-day
//! overdue reminders and logs the current collections effectiveness summary.
//! Reminder text is composed and recorded here; transmission is handled by
//! the notification dispatcher, which reads the recorded actions.

use bursar::{config, core, errors::Result};
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();

    let settings = config::settings::load_or_default();
    info!(school = %settings.school_name, "starting daily collections job");

    // Environment wins over the settings file for the database location
    let db = match settings.database_url.as_deref() {
        Some(url) if std::env::var("DATABASE_URL").is_err() => {
            sea_orm::Database::connect(url).await?
        }
        _ => config::database::create_connection().await?,
    };
    config::database::create_tables(&db).await?;

    let today = chrono::Utc::now().date_naive();

    let run = core::reminders::generate_collection_reminders(&db, today, &settings.school_name)
        .await?;
    info!(
        reminders = run.reminders.len(),
        failures = run.failures.len(),
        "reminder batch complete"
    );
    for failure in &run.failures {
        warn!(
            invoice_id = failure.invoice_id,
            reason = %failure.reason,
            "reminder not generated"
        );
    }

    let report = core::effectiveness::get_collections_effectiveness_report(&db, today).await?;
    info!(
        collected = report.collections.total_amount,
        billed = report.billed_amount,
        rate = report.collection_rate,
        status = report.status.as_str(),
        outstanding = report.outstanding_amount,
        students_in_arrears = report.students_in_arrears,
        "collections effectiveness"
    );

    Ok(())
}
