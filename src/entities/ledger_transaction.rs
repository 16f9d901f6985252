//! Ledger transaction entity - The canonical record of money movement.
//!
//! Rows are never deleted: a mistaken entry is voided by setting the `voided`
//! flag, and every aggregate in the crate filters voided rows out while the
//! row itself remains for audit. `transaction_type` holds the raw stored
//! spelling; [`crate::core::ledger`] owns the canonical vocabulary.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Raw stored transaction type; normalized via `core::ledger::TransactionType`
    pub transaction_type: String,
    /// Amount moved (always positive; direction comes from the type)
    pub amount: f64,
    /// Student the movement concerns; None for non-student transactions
    pub student_id: Option<i64>,
    /// Calendar date the money moved (the date that aging and windows use)
    pub transaction_date: Date,
    /// When the row was recorded
    pub recorded_at: DateTimeUtc,
    /// Free-text reference (receipt number, bank slip, etc.)
    pub reference: Option<String>,
    /// Excluded from every aggregate when true; the row stays for audit
    pub voided: bool,
}

/// Defines relationships between LedgerTransaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each student-scoped transaction belongs to one student
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
