//! Invoice entity - Represents a bill issued to a student for a term.
//!
//! The amount columns mirror the table as it exists in the field: three schema
//! generations of the same financial facts coexist in one table, so every
//! amount column is nullable. `total_amount`/`paid_amount` is the current pair,
//! `amount_owed`/`amount_paid` the previous one, and `amount` is the oldest
//! column whose meaning drifted between generations and is never read alone.
//! All reads of "what does this invoice still owe" go through
//! [`crate::core::normalizer`], never through these columns directly.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the student this invoice bills
    pub student_id: i64,
    /// Academic term the invoice covers (e.g., "2026-T1")
    pub term: String,
    /// Raw stored status; canonicalized at read time by the normalizer
    pub status: Option<String>,
    /// Payment due date; older rows may not have one
    pub due_date: Option<Date>,
    /// Date the invoice was issued
    pub invoice_date: Option<Date>,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// Billed amount, current schema generation
    pub total_amount: Option<f64>,
    /// Amount paid so far, current schema generation
    pub paid_amount: Option<f64>,
    /// Billed amount, previous schema generation
    pub amount_owed: Option<f64>,
    /// Amount paid so far, previous schema generation
    pub amount_paid: Option<f64>,
    /// Oldest amount column; meaning differs between generations, never read alone
    pub amount: Option<f64>,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
