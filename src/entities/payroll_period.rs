//! Payroll period entity - One JST calendar month's closing state.
//!
//! Rows are created lazily on the first close attempt for a month and
//! identified by their `[start_date, end_date]` UTC instants (computed from
//! the JST month bounds, never stored redundantly elsewhere). The closed flag
//! toggles: closing and reopening the same month is a supported cycle, and
//! reopening leaves the previously computed items in place until recomputed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payroll period database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payroll_period")]
pub struct Model {
    /// Unique identifier for the period
    #[sea_orm(primary_key)]
    pub id: i64,
    /// UTC instant of JST month start (1st 00:00:00.000 JST)
    pub start_date: DateTimeUtc,
    /// UTC instant of JST month end (last day 23:59:59.999 JST)
    pub end_date: DateTimeUtc,
    /// Whether payroll for this month is closed (edits locked out)
    pub is_closed: bool,
    /// When the period was last closed; None while open
    pub closed_at: Option<DateTimeUtc>,
    /// Who closed the period; None while open
    pub closed_by_user_id: Option<String>,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// When the row was last mutated
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `PayrollPeriod` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One period has many payroll line items
    #[sea_orm(has_many = "super::payroll_item::Entity")]
    PayrollItems,
}

impl Related<super::payroll_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
