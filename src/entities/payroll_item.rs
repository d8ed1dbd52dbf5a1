//! Payroll item entity - One (period, user) pair's computed pay.
//!
//! Items are recreated wholesale (delete-then-insert) every time their period
//! closes; they are never mutated incrementally. `hourly_rate` is the decimal
//! string snapshot used for the computation; `gross_pay`/`net_pay` are floored
//! integer yen (JPY has no subunits), equal because no deductions are modeled.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payroll item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payroll_item")]
pub struct Model {
    /// Unique identifier for the line item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Period this item was computed for
    pub period_id: i64,
    /// User this item was computed for
    pub user_id: String,
    /// Whole worked minutes (milliseconds floored to minutes)
    pub worked_minutes: i64,
    /// Snapshot of the hourly rate applied; None when no rate was resolvable
    pub hourly_rate: Option<String>,
    /// Gross pay in integer yen, floored
    pub gross_pay: i64,
    /// Net pay in integer yen; equals gross (no tax modeling)
    pub net_pay: i64,
    /// ISO currency code; this system only produces `"JPY"`
    pub currency: String,
    /// Set when the item was produced by a period close
    pub is_locked: bool,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `PayrollItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one payroll period
    #[sea_orm(
        belongs_to = "super::payroll_period::Entity",
        from = "Column::PeriodId",
        to = "super::payroll_period::Column::Id"
    )]
    Period,
    /// Each item belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::payroll_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Period.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
