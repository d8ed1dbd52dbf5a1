//! Retroactive attendance edits with adjacent-record cascade.
//!
//! Punch-recorded chains are contiguous: one record's `ended_at` equals the
//! next one's `started_at`. Moving a boundary therefore moves it for both
//! records, or the chain tears. The cascade finds the adjacent record by
//! that shared instant and rewrites both sides in one transaction, always
//! shrinking an interval before growing its neighbor so no intermediate
//! state holds an inverted interval.
//!
//! Every instant touched - the record's stored ones, the proposed ones, and
//! the adjacent record's own - must fall outside closed payroll months.

use crate::core::{jst, period};
use crate::entities::{AttendanceLog, attendance_log};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

/// One edit: which record, which boundaries move where, and why.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// Id of the record being edited
    pub log_id: i64,
    /// New start instant; `None` leaves the start unchanged
    pub new_started_at: Option<DateTime<Utc>>,
    /// New end instant; `None` leaves the end unchanged
    pub new_ended_at: Option<DateTime<Utc>>,
    /// Mandatory justification, appended to the record's note
    pub reason: String,
    /// Whether adjacent records move with the shared boundary
    pub adjust_adjacent: bool,
}

/// Caller-facing result of an edit; `message` is ready to show in a UI.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// Whether the edit was applied
    pub success: bool,
    /// User-facing description of the result
    pub message: String,
}

/// Applies a retroactive edit at the current time.
pub async fn edit_log(db: &DatabaseConnection, request: EditRequest) -> EditOutcome {
    into_outcome(apply_edit(db, request, Utc::now()).await)
}

/// Edit with an explicit clock for the audit trail. Exposed to tests;
/// [`edit_log`] is the production wrapper.
pub(crate) async fn apply_edit(
    db: &DatabaseConnection,
    request: EditRequest,
    now: DateTime<Utc>,
) -> Result<()> {
    if request.reason.trim().is_empty() {
        return Err(Error::MissingReason);
    }

    let txn = db.begin().await?;

    let log = AttendanceLog::find_by_id(request.log_id)
        .one(&txn)
        .await?
        .ok_or(Error::LogNotFound {
            log_id: request.log_id,
        })?;
    let old_started = log.started_at;
    let old_ended = log.ended_at.ok_or(Error::RecordInProgress { log_id: log.id })?;

    let new_started = request.new_started_at.unwrap_or(old_started);
    let new_ended = request.new_ended_at.unwrap_or(old_ended);
    if new_started >= new_ended {
        return Err(Error::EmptyInterval);
    }

    // Lock guard: neither the stored instants nor the proposed ones may
    // touch a closed month.
    check_unlocked(&txn, old_started, false).await?;
    check_unlocked(&txn, old_ended, false).await?;
    check_unlocked(&txn, new_started, true).await?;
    check_unlocked(&txn, new_ended, true).await?;

    if new_started != old_started {
        move_start(&txn, &log, new_started, request.adjust_adjacent, now).await?;
    }
    if new_ended != old_ended {
        move_end(&txn, &log, new_ended, request.adjust_adjacent, now).await?;
    }

    append_audit(&txn, &log, &request.reason, now).await?;

    txn.commit().await?;

    tracing::info!(
        log_id = log.id,
        user_id = %log.user_id,
        old_started = %old_started,
        old_ended = %old_ended,
        new_started = %new_started,
        new_ended = %new_ended,
        "edited attendance record"
    );

    Ok(())
}

/// Moves the record's start, dragging the previous record's end along when
/// cascading. The shared boundary is found by exact instant equality.
async fn move_start(
    txn: &DatabaseTransaction,
    log: &attendance_log::Model,
    new_started: DateTime<Utc>,
    adjust_adjacent: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let prev = if adjust_adjacent {
        AttendanceLog::find()
            .filter(attendance_log::Column::UserId.eq(&log.user_id))
            .filter(attendance_log::Column::EndedAt.eq(log.started_at))
            .one(txn)
            .await?
    } else {
        None
    };

    let Some(prev) = prev else {
        return set_started(txn, log.id, new_started, now).await;
    };

    // The neighbor's own span must also be outside any closed month
    check_unlocked(txn, prev.started_at, false).await?;
    if new_started <= prev.started_at {
        return Err(Error::EmptyInterval);
    }

    if new_started > log.started_at {
        // Boundary moves later: this record shrinks first, then the
        // previous one grows into the vacated span
        set_started(txn, log.id, new_started, now).await?;
        set_ended(txn, prev.id, new_started, now).await?;
    } else {
        // Boundary moves earlier: the previous record shrinks first
        set_ended(txn, prev.id, new_started, now).await?;
        set_started(txn, log.id, new_started, now).await?;
    }
    Ok(())
}

/// Moves the record's end, dragging the next record's start along when
/// cascading. An in-progress neighbor never moves: the end may retreat,
/// leaving a gap, but may not advance past the neighbor's start.
async fn move_end(
    txn: &DatabaseTransaction,
    log: &attendance_log::Model,
    new_ended: DateTime<Utc>,
    adjust_adjacent: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let old_ended = log.ended_at.ok_or(Error::RecordInProgress { log_id: log.id })?;

    let next = if adjust_adjacent {
        AttendanceLog::find()
            .filter(attendance_log::Column::UserId.eq(&log.user_id))
            .filter(attendance_log::Column::StartedAt.eq(old_ended))
            .one(txn)
            .await?
    } else {
        None
    };

    let Some(next) = next else {
        return set_ended(txn, log.id, new_ended, now).await;
    };

    let Some(next_ended) = next.ended_at else {
        if new_ended > next.started_at {
            return Err(Error::OverlapsOpenRecord);
        }
        // Retreating from an open record leaves a tolerated gap
        return set_ended(txn, log.id, new_ended, now).await;
    };

    check_unlocked(txn, next_ended, false).await?;
    if new_ended >= next_ended {
        return Err(Error::EmptyInterval);
    }

    if new_ended < old_ended {
        // Boundary moves earlier: this record shrinks first, then the next
        // one grows backward into the vacated span
        set_ended(txn, log.id, new_ended, now).await?;
        set_started(txn, next.id, new_ended, now).await?;
    } else {
        // Boundary moves later: the next record shrinks first
        set_started(txn, next.id, new_ended, now).await?;
        set_ended(txn, log.id, new_ended, now).await?;
    }
    Ok(())
}

async fn check_unlocked(
    txn: &DatabaseTransaction,
    instant: DateTime<Utc>,
    proposed: bool,
) -> Result<()> {
    if period::is_period_closed(txn, instant).await? {
        let (year, month) = jst::civil_year_month(instant);
        return Err(if proposed {
            Error::PeriodLockedProposed { year, month }
        } else {
            Error::PeriodLocked { year, month }
        });
    }
    Ok(())
}

async fn set_started(
    txn: &DatabaseTransaction,
    log_id: i64,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    attendance_log::ActiveModel {
        id: Set(log_id),
        started_at: Set(started_at),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}

async fn set_ended(
    txn: &DatabaseTransaction,
    log_id: i64,
    ended_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    attendance_log::ActiveModel {
        id: Set(log_id),
        ended_at: Set(Some(ended_at)),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}

/// Appends an audit block recording when the edit happened, why, and what
/// the interval was before. Notes are append-only; prior content survives.
async fn append_audit(
    txn: &DatabaseTransaction,
    log: &attendance_log::Model,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let old_ended = log.ended_at.ok_or(Error::RecordInProgress { log_id: log.id })?;
    let block = format!(
        "[edited {} JST] reason: {}; before: {} - {}",
        jst::format_jst(now),
        reason.trim(),
        jst::format_jst(log.started_at),
        jst::format_jst(old_ended),
    );
    let note = match &log.note {
        Some(existing) if !existing.is_empty() => format!("{existing}\n{block}"),
        _ => block,
    };
    attendance_log::ActiveModel {
        id: Set(log.id),
        note: Set(Some(note)),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}

fn into_outcome(result: Result<()>) -> EditOutcome {
    match result {
        Ok(()) => EditOutcome {
            success: true,
            message: "Attendance record updated".to_string(),
        },
        Err(Error::Database(err)) => {
            tracing::error!(error = %err, "edit failed on database error");
            EditOutcome {
                success: false,
                message: "Failed to update the attendance record".to_string(),
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "edit rejected");
            EditOutcome {
                success: false,
                message: err.to_string(),
            }
        }
    }
}
