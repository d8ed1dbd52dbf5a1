//! Core business logic - framework-agnostic attendance and payroll operations.
//!
//! Flow: punches run through the state machine in [`punch`], closing records
//! are split at JST civil-day boundaries by [`split`], retroactive changes go
//! through [`edit`] under the period-lock guard in [`period`], and month-end
//! closing drives [`payroll`] aggregation. [`jst`] holds the fixed UTC+9
//! calendar arithmetic everything else leans on.

/// Retroactive edits to closed records, with adjacent-record cascade
pub mod edit;
/// Fixed UTC+9 civil-calendar arithmetic
pub mod jst;
/// Monthly pay aggregation with decimal arithmetic
pub mod payroll;
/// Payroll period locking (close / reopen / containment checks)
pub mod period;
/// Punch state machine and current-status queries
pub mod punch;
/// Civil-day boundary splitting of closing records
pub mod split;
/// Status and source code enums with the punch transition table
pub mod status;

pub use edit::{EditOutcome, EditRequest, edit_log};
pub use payroll::{PayrollLine, WorkingSummary, active_rate_for, aggregate, monthly_working_summary};
pub use period::{CloseOutcome, close_period, is_period_closed, month_status, reopen_period};
pub use punch::{PunchData, PunchOutcome, PunchRequest, get_current_attendance, punch};
pub use status::{AttendanceStatus, PunchSource};
