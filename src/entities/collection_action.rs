//! Collection action entity - An outbound reminder or manual follow-up.
//!
//! Append-only: rows are created by the reminder generator or by staff and are
//! never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Collection action database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collection_actions")]
pub struct Model {
    /// Unique identifier for the action
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student the action concerns
    pub student_id: i64,
    /// Action type: `"first_reminder"`, `"second_reminder"`, `"final_warning"`,
    /// or `"manual_followup"`
    pub action_type: String,
    /// Rendered reminder text or staff notes
    pub notes: String,
    /// When the action was taken
    pub created_at: DateTimeUtc,
}

/// Defines relationships between CollectionAction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each action belongs to one student
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
