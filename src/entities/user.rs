//! User entity - Represents an employee known to the attendance system.
//!
//! User identities come from the external authentication provider; the core
//! only reads this table to resolve names and the admin flag. Row management
//! (invitation, deactivation) belongs to the surrounding application.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    /// Opaque identity assigned by the authentication provider
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Family name
    pub last_name: String,
    /// Given name
    pub first_name: String,
    /// Whether this user may act on other users' records and close payroll
    pub is_admin: bool,
    /// When the user row was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many attendance records
    #[sea_orm(has_many = "super::attendance_log::Entity")]
    AttendanceLogs,
    /// One user has many compensation rate periods
    #[sea_orm(has_many = "super::compensation_rate::Entity")]
    CompensationRates,
    /// One user has many payroll line items
    #[sea_orm(has_many = "super::payroll_item::Entity")]
    PayrollItems,
}

impl Related<super::attendance_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceLogs.def()
    }
}

impl Related<super::compensation_rate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CompensationRates.def()
    }
}

impl Related<super::payroll_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
