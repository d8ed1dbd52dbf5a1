//! Payroll period lifecycle - the monthly lock and its snapshot.
//!
//! Closing a month is the commit point of the whole system: the aggregator
//! runs once, its lines are frozen into `payroll_item` rows, and every
//! attendance record whose instants fall inside the month becomes
//! unmodifiable until an admin reopens it. Splitting guarantees no record
//! straddles a month, so "inside the month" is a plain containment check.

use crate::core::jst;
use crate::core::payroll::{self, PayrollLine};
use crate::entities::{PayrollItem, PayrollPeriod, User, payroll_item, payroll_period};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

/// Caller-facing result of a close or reopen; `message` is ready to show
/// in a UI.
#[derive(Debug, Clone)]
pub struct CloseOutcome {
    /// Whether the request was carried out (or was already satisfied)
    pub success: bool,
    /// User-facing description of the result
    pub message: String,
}

/// Whether `instant` falls inside any closed payroll period.
///
/// Generic over the connection so the edit path can call it inside an open
/// transaction.
pub async fn is_period_closed<C>(conn: &C, instant: DateTime<Utc>) -> Result<bool>
where
    C: sea_orm::ConnectionTrait,
{
    let hit = PayrollPeriod::find()
        .filter(payroll_period::Column::IsClosed.eq(true))
        .filter(payroll_period::Column::StartDate.lte(instant))
        .filter(payroll_period::Column::EndDate.gte(instant))
        .one(conn)
        .await?;
    Ok(hit.is_some())
}

/// The period row for a JST month, if one has been created yet.
pub async fn month_status(
    db: &DatabaseConnection,
    year: i32,
    month: u32,
) -> Result<Option<payroll_period::Model>> {
    let (start, _) = jst::civil_month_range(year, month)?;
    PayrollPeriod::find()
        .filter(payroll_period::Column::StartDate.eq(start))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Closes a JST month: aggregates pay, freezes the lines, and locks the
/// period. Idempotent: closing an already-closed month changes nothing.
pub async fn close_period(
    db: &DatabaseConnection,
    actor_id: &str,
    year: i32,
    month: u32,
) -> CloseOutcome {
    into_outcome(close_period_at(db, actor_id, year, month, Utc::now()).await)
}

/// Reopens a closed JST month so records can be corrected. The frozen
/// payroll items are left in place; the next close replaces them.
pub async fn reopen_period(
    db: &DatabaseConnection,
    actor_id: &str,
    year: i32,
    month: u32,
) -> CloseOutcome {
    into_outcome(reopen_period_at(db, actor_id, year, month, Utc::now()).await)
}

pub(crate) async fn close_period_at(
    db: &DatabaseConnection,
    actor_id: &str,
    year: i32,
    month: u32,
    now: DateTime<Utc>,
) -> Result<String> {
    require_admin(db, actor_id).await?;
    let (start, end) = jst::civil_month_range(year, month)?;

    let period = find_or_create_period(db, start, end, now).await?;
    if period.is_closed {
        return Ok(format!("Payroll for {year}-{month:02} is already closed"));
    }

    let lines = payroll::aggregate(db, start, end).await?;

    // Snapshot and lock must land together
    let txn = db.begin().await?;

    // A reopened month may still carry items from its previous close
    PayrollItem::delete_many()
        .filter(payroll_item::Column::PeriodId.eq(period.id))
        .exec(&txn)
        .await?;

    for line in &lines {
        insert_item(&txn, period.id, line, now).await?;
    }

    let mut active: payroll_period::ActiveModel = period.into();
    active.is_closed = Set(true);
    active.closed_at = Set(Some(now));
    active.closed_by_user_id = Set(Some(actor_id.to_string()));
    active.updated_at = Set(now);
    active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        year,
        month,
        closed_by = actor_id,
        items = lines.len(),
        "closed payroll period"
    );

    Ok(format!(
        "Closed payroll for {year}-{month:02} ({} item{})",
        lines.len(),
        if lines.len() == 1 { "" } else { "s" }
    ))
}

pub(crate) async fn reopen_period_at(
    db: &DatabaseConnection,
    actor_id: &str,
    year: i32,
    month: u32,
    now: DateTime<Utc>,
) -> Result<String> {
    require_admin(db, actor_id).await?;
    let (start, _) = jst::civil_month_range(year, month)?;

    let period = PayrollPeriod::find()
        .filter(payroll_period::Column::StartDate.eq(start))
        .one(db)
        .await?;
    let Some(period) = period else {
        return Ok(format!("Payroll for {year}-{month:02} has never been closed"));
    };
    if !period.is_closed {
        return Ok(format!("Payroll for {year}-{month:02} is not closed"));
    }

    let mut active: payroll_period::ActiveModel = period.into();
    active.is_closed = Set(false);
    active.closed_at = Set(None);
    active.closed_by_user_id = Set(None);
    active.updated_at = Set(now);
    active.update(db).await?;

    tracing::info!(year, month, reopened_by = actor_id, "reopened payroll period");

    Ok(format!("Reopened payroll for {year}-{month:02}"))
}

async fn require_admin(db: &DatabaseConnection, actor_id: &str) -> Result<()> {
    let actor = User::find_by_id(actor_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: actor_id.to_string(),
        })?;
    if !actor.is_admin {
        return Err(Error::PermissionDenied { user_id: actor.id });
    }
    Ok(())
}

async fn find_or_create_period(
    db: &DatabaseConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<payroll_period::Model> {
    if let Some(existing) = PayrollPeriod::find()
        .filter(payroll_period::Column::StartDate.eq(start))
        .one(db)
        .await?
    {
        return Ok(existing);
    }
    payroll_period::ActiveModel {
        start_date: Set(start),
        end_date: Set(end),
        is_closed: Set(false),
        closed_at: Set(None),
        closed_by_user_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

async fn insert_item<C>(
    conn: &C,
    period_id: i64,
    line: &PayrollLine,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: sea_orm::ConnectionTrait,
{
    payroll_item::ActiveModel {
        period_id: Set(period_id),
        user_id: Set(line.user_id.clone()),
        worked_minutes: Set(line.worked_minutes),
        hourly_rate: Set(line.hourly_rate.map(|rate| rate.to_string())),
        gross_pay: Set(line.gross_pay),
        net_pay: Set(line.net_pay),
        currency: Set("JPY".to_string()),
        is_locked: Set(true),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(())
}

fn into_outcome(result: Result<String>) -> CloseOutcome {
    match result {
        Ok(message) => CloseOutcome {
            success: true,
            message,
        },
        Err(Error::Database(err)) => {
            tracing::error!(error = %err, "period operation failed on database error");
            CloseOutcome {
                success: false,
                message: "Failed to update the payroll period".to_string(),
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "period operation rejected");
            CloseOutcome {
                success: false,
                message: err.to_string(),
            }
        }
    }
}
