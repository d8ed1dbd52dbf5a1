//! Punch recording - the attendance state machine entry point.
//!
//! A punch closes the user's open record (splitting it at civil-day
//! boundaries if needed) and opens a new one for the punched status, both
//! inside one transaction so a concurrent punch can never observe zero or
//! two open records. The partial unique index on `(user_id) WHERE ended_at
//! IS NULL` backstops the race: a conflicting concurrent punch fails hard
//! instead of corrupting the chain.
//!
//! The "current status" concept is derived, never cached: a user's status is
//! whatever their open record says, or clocked out if none exists.

use crate::core::split;
use crate::core::status::{AttendanceStatus, PunchSource};
use crate::entities::{AttendanceLog, User, attendance_log};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

/// One punch event: who is punching, for whom, to which status, from where.
#[derive(Debug, Clone)]
pub struct PunchRequest {
    /// The authenticated user performing the punch
    pub actor_id: String,
    /// The user whose attendance is being recorded (differs from `actor_id`
    /// only for admins punching on behalf of someone)
    pub user_id: String,
    /// The status being punched
    pub action: AttendanceStatus,
    /// Where the punch came from
    pub source: PunchSource,
    /// Optional note stored on the newly opened record
    pub note: Option<String>,
}

/// Details of the record a successful punch opened.
#[derive(Debug, Clone)]
pub struct PunchData {
    /// Id of the newly opened record
    pub log_id: i64,
    /// Status of the newly opened record
    pub status: AttendanceStatus,
    /// When the new record began
    pub started_at: DateTime<Utc>,
}

/// Caller-facing result of a punch; `message` is ready to show in a UI.
#[derive(Debug, Clone)]
pub struct PunchOutcome {
    /// Whether the punch was recorded
    pub success: bool,
    /// User-facing description of the result
    pub message: String,
    /// Present on success
    pub data: Option<PunchData>,
}

/// Records a punch at the current time.
///
/// Business-rule rejections (disallowed transitions) and infrastructure
/// faults both come back as a [`PunchOutcome`]; only the former carry their
/// specific message through, database faults are reported generically and
/// logged.
pub async fn punch(db: &DatabaseConnection, request: PunchRequest) -> PunchOutcome {
    let action = request.action;
    into_outcome(action, record_punch_at(db, request, Utc::now()).await)
}

/// Punch with an explicit clock, one `now` per operation. Exposed to tests;
/// [`punch`] is the production wrapper.
pub(crate) async fn record_punch_at(
    db: &DatabaseConnection,
    request: PunchRequest,
    now: DateTime<Utc>,
) -> Result<PunchData> {
    let actor = User::find_by_id(&request.actor_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: request.actor_id.clone(),
        })?;
    let target = User::find_by_id(&request.user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: request.user_id.clone(),
        })?;

    // Non-admins may only punch for themselves
    if !actor.is_admin && actor.id != target.id {
        return Err(Error::PermissionDenied { user_id: actor.id });
    }

    let open = find_open_log(db, &target.id).await?;

    if let Some(ref open_log) = open {
        let current = AttendanceStatus::from_id(open_log.status_id)?;
        if !current.can_transition_to(request.action) {
            return Err(current.transition_error(request.action));
        }
    }

    // Close-old and open-new must commit together
    let txn = db.begin().await?;

    if let Some(ref open_log) = open {
        split::close_open_log(&txn, open_log, now, request.source).await?;
    }

    let new_log = attendance_log::ActiveModel {
        user_id: Set(target.id.clone()),
        status_id: Set(request.action.id()),
        started_at: Set(now),
        ended_at: Set(None),
        started_source: Set(request.source.id()),
        ended_source: Set(None),
        note: Set(request.note),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        user_id = %target.id,
        status = %request.action,
        source = %request.source,
        log_id = new_log.id,
        "recorded punch"
    );

    Ok(PunchData {
        log_id: new_log.id,
        status: request.action,
        started_at: new_log.started_at,
    })
}

/// The user's open (in-progress) record, if any. This query *is* the user's
/// current status; absence means clocked out.
pub async fn get_current_attendance(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<attendance_log::Model>> {
    find_open_log(db, user_id).await
}

async fn find_open_log(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<attendance_log::Model>> {
    AttendanceLog::find()
        .filter(attendance_log::Column::UserId.eq(user_id))
        .filter(attendance_log::Column::EndedAt.is_null())
        .one(db)
        .await
        .map_err(Into::into)
}

fn success_message(action: AttendanceStatus) -> &'static str {
    match action {
        AttendanceStatus::Working => "Started working",
        AttendanceStatus::Break => "Started break",
        AttendanceStatus::Off => "Clocked out",
    }
}

fn into_outcome(action: AttendanceStatus, result: Result<PunchData>) -> PunchOutcome {
    match result {
        Ok(data) => PunchOutcome {
            success: true,
            message: success_message(action).to_string(),
            data: Some(data),
        },
        Err(Error::Database(err)) => {
            tracing::error!(error = %err, "punch failed on database error");
            PunchOutcome {
                success: false,
                message: "Failed to record the punch".to_string(),
                data: None,
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "punch rejected");
            PunchOutcome {
                success: false,
                message: err.to_string(),
                data: None,
            }
        }
    }
}
