//! Compensation rate entity - A user's hourly pay rate over a validity window.
//!
//! Validity is the half-open `[effective_from, effective_to)`; a NULL
//! `effective_to` means open-ended, and a user may have at most one open-ended
//! rate. Rows are immutable: a rate change inserts a new row and closes the
//! previous one. `hourly_rate` is stored as a decimal string and parsed with
//! `rust_decimal` in the payroll path; monetary values never pass through
//! binary floats.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Compensation rate database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "compensation_rate")]
pub struct Model {
    /// Unique identifier for the rate period
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user's id
    pub user_id: String,
    /// Hourly rate as a decimal string (e.g., `"1250"`, `"1312.50"`)
    pub hourly_rate: String,
    /// ISO currency code; this system only produces `"JPY"`
    pub currency: String,
    /// Start of the validity window (inclusive)
    pub effective_from: DateTimeUtc,
    /// End of the validity window (exclusive); None = open-ended
    pub effective_to: Option<DateTimeUtc>,
    /// Soft-disable flag; inactive rates are ignored by aggregation
    pub is_active: bool,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `CompensationRate` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each rate period belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
