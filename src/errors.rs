//! Unified error handling for the attendance core.
//!
//! Business-rule violations (disallowed transitions, period locks, overlaps)
//! and infrastructure faults (database, lookups) share one enum so that a
//! transaction can abort on either kind with `?`. The public operation
//! wrappers in [`crate::core`] convert business variants into user-facing
//! `{success: false, message}` outcomes and keep infrastructure faults
//! generic; see [`Error::is_business_rule`].

use thiserror::Error;

/// All failure modes surfaced by the attendance and payroll core.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or input validation problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
    },

    /// Underlying database failure (connection, constraint, transaction)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Referenced user does not exist
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// The missing user's id
        user_id: String,
    },

    /// Referenced attendance log does not exist
    #[error("Attendance record not found: {log_id}")]
    LogNotFound {
        /// The missing record's id
        log_id: i64,
    },

    /// Actor is not allowed to act on the target user's records
    #[error("Permission denied for user {user_id}")]
    PermissionDenied {
        /// The acting user's id
        user_id: String,
    },

    /// A status id read from the database is outside the closed enum domain
    #[error("Unknown attendance status code: {code}")]
    InvalidStatusCode {
        /// The unrecognized status id
        code: i16,
    },

    /// A source id read from the database is outside the closed enum domain
    #[error("Unknown punch source code: {code}")]
    InvalidSourceCode {
        /// The unrecognized source id
        code: i16,
    },

    /// The requested punch is not allowed from the current status
    #[error(
        "Cannot switch from {current} to {attempted}; allowed next statuses: {allowed}"
    )]
    InvalidTransition {
        /// Label of the currently open status
        current: String,
        /// Label of the attempted status
        attempted: String,
        /// Comma-separated labels of the statuses reachable from `current`
        allowed: String,
    },

    /// A stored instant of the record falls inside a closed payroll month
    #[error("Payroll for {year}-{month:02} is already closed; this record cannot be modified")]
    PeriodLocked {
        /// JST calendar year of the locked month
        year: i32,
        /// JST calendar month (1-12)
        month: u32,
    },

    /// A proposed new instant would land inside a closed payroll month
    #[error("The proposed time falls inside the closed payroll period {year}-{month:02}")]
    PeriodLockedProposed {
        /// JST calendar year of the locked month
        year: i32,
        /// JST calendar month (1-12)
        month: u32,
    },

    /// An edit would push a boundary past an in-progress record's start
    #[error("The new end time overlaps the record currently in progress")]
    OverlapsOpenRecord,

    /// Every edit must carry a non-empty reason
    #[error("A reason is required when editing an attendance record")]
    MissingReason,

    /// The edit would produce a zero-length or negative interval
    #[error("The start time must be before the end time")]
    EmptyInterval,

    /// In-progress records are closed via punching, not editing
    #[error("Record {log_id} is still in progress and cannot be edited")]
    RecordInProgress {
        /// The open record's id
        log_id: i64,
    },
}

impl Error {
    /// Whether this failure is a business-rule rejection whose message is
    /// meant to be shown to the user verbatim, as opposed to an
    /// infrastructure fault that callers should report generically.
    #[must_use]
    pub const fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::PeriodLocked { .. }
                | Self::PeriodLockedProposed { .. }
                | Self::OverlapsOpenRecord
                | Self::MissingReason
                | Self::EmptyInterval
                | Self::RecordInProgress { .. }
                | Self::Config { .. }
        )
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
