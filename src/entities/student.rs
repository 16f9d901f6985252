//! Student entity - Represents an enrolled student account.
//!
//! Each student carries identity fields used on collections reports (name,
//! `admission_number`) plus a `credit_balance` that accumulates overpayments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name as printed on reports
    pub name: String,
    /// School admission number (human-facing account reference)
    pub admission_number: String,
    /// Guardian contact used when composing reminders, if on record
    pub guardian_phone: Option<String>,
    /// Credit accumulated from overpayments, drawn down by future invoices
    pub credit_balance: f64,
    /// Whether the student is currently enrolled
    pub is_active: bool,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many invoices
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
    /// One student has many ledger transactions
    #[sea_orm(has_many = "super::ledger_transaction::Entity")]
    LedgerTransactions,
    /// One student has many collection actions
    #[sea_orm(has_many = "super::collection_action::Entity")]
    CollectionActions,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::ledger_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerTransactions.def()
    }
}

impl Related<super::collection_action::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CollectionActions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
