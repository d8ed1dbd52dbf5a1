//! Attendance log entity - One user's occupancy of one status over one span.
//!
//! `ended_at = NULL` marks the record as in progress; at most one open record
//! may exist per user, enforced by a partial unique index created in
//! [`crate::config::database`]. Records never cross a JST civil-day boundary:
//! the punch path splits them at write time (see [`crate::core::split`]).
//! `note` is an append-only audit trail once a record has been edited.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_log")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user's id
    pub user_id: String,
    /// Status code: 1 = OFF, 2 = WORKING, 3 = BREAK
    /// (see [`crate::core::status::AttendanceStatus`])
    pub status_id: i16,
    /// When this span began (UTC instant)
    pub started_at: DateTimeUtc,
    /// When this span ended; None while in progress
    pub ended_at: Option<DateTimeUtc>,
    /// Origin of the opening punch: 1 = WEB, 2 = DISCORD, 3 = NFC, 4 = ADMIN
    pub started_source: i16,
    /// Origin of the closing punch; None while in progress
    pub ended_source: Option<i16>,
    /// Free text; edits append audit blocks and synthetic split records are
    /// marked `"auto-generated"`
    pub note: Option<String>,
    /// When the row was inserted
    pub created_at: DateTimeUtc,
    /// When the row was last mutated
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `AttendanceLog` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each attendance record belongs to one user
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
