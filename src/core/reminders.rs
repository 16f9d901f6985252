//! Collection reminders - composing overdue notices at fixed thresholds and
//! recording them as collection actions.
//!
//! A reminder fires only when an invoice is exactly 30, 60, or 90 days
//! overdue; the thresholds are point events, and the external scheduler runs
//! this once per day so each invoice is caught exactly once per tier. This
//! module only composes the text and records the action; transmission belongs
//! to the notification dispatcher.
//!
//! The batch is best-effort: one student's failure is recorded and the rest
//! of the batch continues.

use crate::{
    core::normalizer,
    entities::{collection_action, invoice, student},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, Order, QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};

/// Reminder tiers, one per overdue-day threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderTier {
    /// 30 days overdue - informational
    First,
    /// 60 days overdue - urgent
    Second,
    /// 90 days overdue - final warning before account suspension
    Final,
}

impl ReminderTier {
    /// Tier for an exact days-overdue value, if it is a threshold day.
    #[must_use]
    pub const fn for_days_overdue(days: i64) -> Option<Self> {
        match days {
            30 => Some(Self::First),
            60 => Some(Self::Second),
            90 => Some(Self::Final),
            _ => None,
        }
    }

    /// Action type recorded against the student.
    #[must_use]
    pub const fn action_type(self) -> &'static str {
        match self {
            Self::First => "first_reminder",
            Self::Second => "second_reminder",
            Self::Final => "final_warning",
        }
    }

    /// Renders the reminder text for this tier.
    #[must_use]
    pub fn render(
        self,
        school_name: &str,
        student_name: &str,
        admission_number: &str,
        amount_due: f64,
        days_overdue: i64,
    ) -> String {
        match self {
            Self::First => format!(
                "Dear guardian of {student_name} ({admission_number}), this is a friendly reminder that fees of {amount_due:.2} owed to {school_name} are now {days_overdue} days overdue. Kindly arrange payment at your earliest convenience."
            ),
            Self::Second => format!(
                "Dear guardian of {student_name} ({admission_number}), fees of {amount_due:.2} owed to {school_name} are now {days_overdue} days overdue. Please settle this balance urgently to avoid further action."
            ),
            Self::Final => format!(
                "FINAL WARNING: fees of {amount_due:.2} for {student_name} ({admission_number}) are {days_overdue} days overdue. Unless payment reaches {school_name} immediately, the account will be suspended."
            ),
        }
    }
}

/// One composed reminder, paired with its persisted collection action.
#[derive(Debug, Clone)]
pub struct Reminder {
    /// Student the reminder addresses
    pub student_id: i64,
    /// Invoice that hit the threshold
    pub invoice_id: i64,
    /// Which tier fired
    pub tier: ReminderTier,
    /// Outstanding amount on the triggering invoice
    pub amount_due: f64,
    /// Exact days overdue (30, 60, or 90)
    pub days_overdue: i64,
    /// Rendered message text, also stored in the action's notes
    pub message: String,
    /// The persisted collection action
    pub action: collection_action::Model,
}

/// A reminder that could not be produced; the batch carried on without it.
#[derive(Debug, Clone)]
pub struct ReminderFailure {
    /// Invoice whose reminder failed
    pub invoice_id: i64,
    /// Student it would have addressed, when known
    pub student_id: Option<i64>,
    /// Why it failed
    pub reason: String,
}

/// Outcome of one reminder batch.
#[derive(Debug, Clone)]
pub struct ReminderRun {
    /// Reminders composed and recorded
    pub reminders: Vec<Reminder>,
    /// Failures accumulated along the way
    pub failures: Vec<ReminderFailure>,
}

/// Records a manual collection follow-up made by staff.
///
/// # Errors
/// Propagates database failures.
pub async fn record_collection_action(
    db: &DatabaseConnection,
    student_id: i64,
    action_type: &str,
    notes: String,
) -> Result<collection_action::Model> {
    let action = collection_action::ActiveModel {
        student_id: Set(student_id),
        action_type: Set(action_type.to_string()),
        notes: Set(notes),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    action.insert(db).await.map_err(Into::into)
}

/// Generates reminders for every outstanding invoice that is exactly 30, 60,
/// or 90 days overdue as of `today`, recording one collection action per
/// reminder.
///
/// # Errors
/// Only the initial invoice query can fail the batch; per-invoice failures
/// are accumulated in the returned [`ReminderRun`].
pub async fn generate_collection_reminders(
    db: &DatabaseConnection,
    today: NaiveDate,
    school_name: &str,
) -> Result<ReminderRun> {
    let rows = normalizer::outstanding_invoices()
        .filter(invoice::Column::DueDate.is_not_null())
        .filter(invoice::Column::DueDate.lte(today))
        .order_by(normalizer::due_order_expr(), Order::Asc)
        .find_also_related(crate::entities::Student)
        .all(db)
        .await?;

    let mut run = ReminderRun {
        reminders: Vec::new(),
        failures: Vec::new(),
    };

    for (inv, maybe_student) in rows {
        let Some(due) = inv.due_date else { continue };
        let days_overdue = (today - due).num_days();
        let Some(tier) = ReminderTier::for_days_overdue(days_overdue) else {
            continue;
        };

        let student: student::Model = match maybe_student {
            Some(s) => s,
            None => {
                warn!(invoice_id = inv.id, "reminder skipped: student missing");
                run.failures.push(ReminderFailure {
                    invoice_id: inv.id,
                    student_id: None,
                    reason: format!("student {} not found", inv.student_id),
                });
                continue;
            }
        };

        let amount_due = match normalizer::outstanding_balance(&inv) {
            Ok(a) => a,
            Err(e) => {
                warn!(invoice_id = inv.id, error = %e, "reminder skipped");
                run.failures.push(ReminderFailure {
                    invoice_id: inv.id,
                    student_id: Some(student.id),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let message = tier.render(
            school_name,
            &student.name,
            &student.admission_number,
            amount_due,
            days_overdue,
        );

        match record_collection_action(db, student.id, tier.action_type(), message.clone()).await {
            Ok(action) => {
                info!(
                    student_id = student.id,
                    invoice_id = inv.id,
                    tier = tier.action_type(),
                    "reminder recorded"
                );
                run.reminders.push(Reminder {
                    student_id: student.id,
                    invoice_id: inv.id,
                    tier,
                    amount_due,
                    days_overdue,
                    message,
                    action,
                });
            }
            Err(e) => {
                warn!(student_id = student.id, error = %e, "failed to record reminder");
                run.failures.push(ReminderFailure {
                    invoice_id: inv.id,
                    student_id: Some(student.id),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(run)
}
