//! Shared fixtures for the test suite: an in-memory database with the full
//! schema, plus builders for users, records, and rates at fixed instants.

#![allow(clippy::unwrap_used)]

use crate::config::database::create_tables;
use crate::core::punch::{PunchData, PunchRequest, record_punch_at};
use crate::core::status::{AttendanceStatus, PunchSource};
use crate::entities::{attendance_log, compensation_rate, user};
use crate::errors::Result;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Installs a `tracing` subscriber for test output, once per process.
/// Verbosity follows `RUST_LOG`; nothing is printed unless it is set.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Fresh in-memory SQLite database with all tables and indexes created.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// [`setup_test_db`] plus one non-admin user "u1".
pub async fn setup_with_user() -> Result<(DatabaseConnection, user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "u1", false).await?;
    Ok((db, user))
}

pub async fn create_test_user(
    db: &DatabaseConnection,
    id: &str,
    is_admin: bool,
) -> Result<user::Model> {
    user::ActiveModel {
        id: Set(id.to_string()),
        last_name: Set("Test".to_string()),
        first_name: Set(id.to_string()),
        is_admin: Set(is_admin),
        created_at: Set(jst_instant(2023, 1, 1, 0, 0)),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts an in-progress record directly, bypassing the punch path.
pub async fn create_open_log(
    db: &DatabaseConnection,
    user_id: &str,
    status: AttendanceStatus,
    started_at: DateTime<Utc>,
) -> Result<attendance_log::Model> {
    attendance_log::ActiveModel {
        user_id: Set(user_id.to_string()),
        status_id: Set(status.id()),
        started_at: Set(started_at),
        ended_at: Set(None),
        started_source: Set(PunchSource::Web.id()),
        ended_source: Set(None),
        note: Set(None),
        created_at: Set(started_at),
        updated_at: Set(started_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a closed record directly, bypassing the punch path.
pub async fn create_closed_log(
    db: &DatabaseConnection,
    user_id: &str,
    status: AttendanceStatus,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> Result<attendance_log::Model> {
    attendance_log::ActiveModel {
        user_id: Set(user_id.to_string()),
        status_id: Set(status.id()),
        started_at: Set(started_at),
        ended_at: Set(Some(ended_at)),
        started_source: Set(PunchSource::Web.id()),
        ended_source: Set(Some(PunchSource::Web.id())),
        note: Set(None),
        created_at: Set(started_at),
        updated_at: Set(ended_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts an active compensation rate row.
pub async fn create_rate(
    db: &DatabaseConnection,
    user_id: &str,
    hourly_rate: &str,
    effective_from: DateTime<Utc>,
    effective_to: Option<DateTime<Utc>>,
) -> Result<compensation_rate::Model> {
    compensation_rate::ActiveModel {
        user_id: Set(user_id.to_string()),
        hourly_rate: Set(hourly_rate.to_string()),
        currency: Set("JPY".to_string()),
        effective_from: Set(effective_from),
        effective_to: Set(effective_to),
        is_active: Set(true),
        created_at: Set(effective_from),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Self-punch from the web at an explicit instant.
pub async fn punch_at(
    db: &DatabaseConnection,
    user_id: &str,
    action: AttendanceStatus,
    now: DateTime<Utc>,
) -> Result<PunchData> {
    record_punch_at(
        db,
        PunchRequest {
            actor_id: user_id.to_string(),
            user_id: user_id.to_string(),
            action,
            source: PunchSource::Web,
            note: None,
        },
        now,
    )
    .await
}

/// UTC instant of the given JST wall-clock time.
pub fn jst_instant(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    jst_instant_ms(year, month, day, hour, minute, 0, 0)
}

/// UTC instant of the given JST wall-clock time with seconds and millis.
pub fn jst_instant_ms(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    milli: u32,
) -> DateTime<Utc> {
    crate::core::jst::jst()
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .unwrap()
        .with_timezone(&Utc)
        + chrono::Duration::milliseconds(i64::from(milli))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_init_is_idempotent() {
        // Parallel tests all go through setup_test_db; a second install
        // attempt must be a no-op, not a panic.
        init_test_tracing();
        init_test_tracing();
        assert!(TRACING.is_completed());
    }
}
