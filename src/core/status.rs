//! Attendance status and punch source codes.
//!
//! Both domains are closed: rows store small-integer codes, but the core only
//! ever reasons about these enums, and the punch transition table lives here
//! in one place rather than scattered through conditionals.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Status of an attendance record. The absence of an open record is an
/// implicit initial state permitting any action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    /// Clocked out
    Off,
    /// Working
    Working,
    /// On break
    Break,
}

impl AttendanceStatus {
    /// Small-integer code stored in `attendance_log.status_id`.
    #[must_use]
    pub const fn id(self) -> i16 {
        match self {
            Self::Off => 1,
            Self::Working => 2,
            Self::Break => 3,
        }
    }

    /// Resolves a stored status code; an unknown code is a hard error
    /// (corrupt data, not user input).
    pub const fn from_id(id: i16) -> Result<Self> {
        match id {
            1 => Ok(Self::Off),
            2 => Ok(Self::Working),
            3 => Ok(Self::Break),
            code => Err(Error::InvalidStatusCode { code }),
        }
    }

    /// Stable machine-facing code, as used by external punch sources.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Working => "WORKING",
            Self::Break => "BREAK",
        }
    }

    /// Human-facing label for messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "clocked out",
            Self::Working => "working",
            Self::Break => "on break",
        }
    }

    /// The statuses reachable from this one while a record of this status is
    /// open. With no open record, any status may be punched.
    #[must_use]
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Working => &[Self::Break, Self::Off],
            Self::Break => &[Self::Working, Self::Off],
            Self::Off => &[Self::Working],
        }
    }

    /// Whether punching `next` is valid while a record of this status is open.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Builds the structured rejection for a disallowed transition, naming
    /// the current status, the attempted one, and the valid alternatives.
    #[must_use]
    pub fn transition_error(self, attempted: Self) -> Error {
        let allowed = self
            .allowed_next()
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ");
        Error::InvalidTransition {
            current: self.label().to_string(),
            attempted: attempted.label().to_string(),
            allowed,
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Origin of a punch event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PunchSource {
    /// Browser punch page
    Web,
    /// Discord bot command
    Discord,
    /// NFC card reader
    Nfc,
    /// Admin acting on behalf of a user
    Admin,
}

impl PunchSource {
    /// Small-integer code stored in the source columns.
    #[must_use]
    pub const fn id(self) -> i16 {
        match self {
            Self::Web => 1,
            Self::Discord => 2,
            Self::Nfc => 3,
            Self::Admin => 4,
        }
    }

    /// Resolves a stored source code; an unknown code is a hard error.
    pub const fn from_id(id: i16) -> Result<Self> {
        match id {
            1 => Ok(Self::Web),
            2 => Ok(Self::Discord),
            3 => Ok(Self::Nfc),
            4 => Ok(Self::Admin),
            code => Err(Error::InvalidSourceCode { code }),
        }
    }

    /// Stable machine-facing code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Web => "WEB",
            Self::Discord => "DISCORD",
            Self::Nfc => "NFC",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for PunchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
