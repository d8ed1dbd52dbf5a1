//! Civil-day boundary splitting of closing attendance records.
//!
//! Downstream aggregation (payroll, monthly reports) assumes every closed
//! record lies within a single JST civil day, and therefore within a single
//! civil month. Splitting happens once, at the moment an open record is closed,
//! so no read site ever needs boundary-aware slicing: a record opened on one
//! day and closed days later becomes a chain of contiguous, same-status,
//! single-day records covering the original span exactly.
//!
//! Everything here runs on the caller's connection, which in the punch path
//! is an open transaction: a partially written split is never observable.

use crate::core::jst;
use crate::core::status::PunchSource;
use crate::entities::attendance_log;
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};

/// Marker written into `note` on records the splitter fabricates.
pub const AUTO_GENERATED_NOTE: &str = "auto-generated";

/// Closes `log` at `now`, splitting it at JST civil-day boundaries when the
/// span crosses one.
///
/// Same-day close simply sets `ended_at`. A cross-day close rewrites the
/// record to end at its start day's 23:59:59.999 JST, inserts one synthetic
/// full-day record per intervening civil day, and inserts a tail fragment
/// from the closing day's midnight up to `now`. A close landing exactly on a
/// civil midnight writes no tail: the instant belongs to the day that is
/// starting, and a zero-length record would be invalid.
pub(crate) async fn close_open_log<C>(
    conn: &C,
    log: &attendance_log::Model,
    now: DateTime<Utc>,
    source: PunchSource,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if jst::is_same_civil_day(log.started_at, now) {
        let mut active: attendance_log::ActiveModel = log.clone().into();
        active.ended_at = Set(Some(now));
        active.ended_source = Set(Some(source.id()));
        active.updated_at = Set(now);
        active.update(conn).await?;
        return Ok(());
    }

    tracing::debug!(
        log_id = log.id,
        started_at = %log.started_at,
        closed_at = %now,
        "closing record across civil-day boundary"
    );

    // Head fragment: the original record, truncated to its start day.
    let head_end = jst::civil_day_end(log.started_at);
    let mut active: attendance_log::ActiveModel = log.clone().into();
    active.ended_at = Set(Some(head_end));
    active.ended_source = Set(Some(source.id()));
    active.updated_at = Set(now);
    active.update(conn).await?;

    // One synthetic record per full intervening civil day.
    for day_start in jst::civil_days_between_exclusive(log.started_at, now) {
        insert_synthetic(conn, log, day_start, jst::civil_day_end(day_start), now, source).await?;
    }

    // Tail fragment covering the closing day up to the actual closing
    // instant. Skipped when `now` is exactly midnight.
    let tail_start = jst::civil_day_start(now);
    if now > tail_start {
        insert_synthetic(conn, log, tail_start, now, now, source).await?;
    }

    Ok(())
}

/// Inserts one closed continuation record carrying the split record's user
/// and status, marked auto-generated.
async fn insert_synthetic<C>(
    conn: &C,
    origin: &attendance_log::Model,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    now: DateTime<Utc>,
    source: PunchSource,
) -> Result<()>
where
    C: ConnectionTrait,
{
    attendance_log::ActiveModel {
        user_id: Set(origin.user_id.clone()),
        status_id: Set(origin.status_id),
        started_at: Set(started_at),
        ended_at: Set(Some(ended_at)),
        started_source: Set(source.id()),
        ended_source: Set(Some(source.id())),
        note: Set(Some(AUTO_GENERATED_NOTE.to_string())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}
