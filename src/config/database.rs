//! Database configuration module for `Timeclock`.
//!
//! This module handles `SQLite` database connection and table creation using
//! `SeaORM`. Tables are generated from the entity definitions via
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. The one exception is the partial unique
//! index guaranteeing at most one open attendance record per user, which
//! `SeaORM`'s schema builder cannot express and which is issued as raw SQL.
//! That index is the backstop that turns a concurrent double-punch race into
//! a constraint violation instead of silent data corruption.

use crate::entities::{AttendanceLog, CompensationRate, PayrollItem, PayrollPeriod, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the environment or returns the default
/// `SQLite` path.
///
/// Reads `.env` via `dotenvy` first, so local development can keep the URL
/// out of the shell environment.
pub fn get_database_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/timeclock.sqlite".to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`,
/// falling back to a local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions, plus the partial unique
/// index enforcing the at-most-one-open-record-per-user invariant.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let user_table = schema.create_table_from_entity(User);
    let attendance_log_table = schema.create_table_from_entity(AttendanceLog);
    let compensation_rate_table = schema.create_table_from_entity(CompensationRate);
    let payroll_period_table = schema.create_table_from_entity(PayrollPeriod);
    let payroll_item_table = schema.create_table_from_entity(PayrollItem);

    db.execute(builder.build(&user_table)).await?;
    db.execute(builder.build(&attendance_log_table)).await?;
    db.execute(builder.build(&compensation_rate_table)).await?;
    db.execute(builder.build(&payroll_period_table)).await?;
    db.execute(builder.build(&payroll_item_table)).await?;

    // At most one in-progress record per user. SQLite supports partial
    // indexes natively.
    db.execute_unprepared(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_attendance_log_open_per_user \
         ON attendance_log (user_id) WHERE ended_at IS NULL",
    )
    .await?;

    Ok(())
}
