//! Text command codec for the relock unit.
//!
//! The lock speaks a line-oriented ASCII protocol: every command is a fixed
//! keyword (plus at most one argument) terminated by `\n`. Responses are
//! free text and are undelimited at the transport level — one read may
//! carry half a message or several, so recognition works on substrings.
//! Text that matches no known phrase is ignored, not an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerated auto-relock delays accepted by `locktimer`.
///
/// The wire argument is the zero-padded second count, e.g. `locktimer 0030`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockInterval {
    Secs5,
    Secs10,
    Secs30,
    Secs60,
    Hour1,
    Hour2,
}

impl LockInterval {
    /// All intervals, in ascending order.
    pub const ALL: [LockInterval; 6] = [
        LockInterval::Secs5,
        LockInterval::Secs10,
        LockInterval::Secs30,
        LockInterval::Secs60,
        LockInterval::Hour1,
        LockInterval::Hour2,
    ];

    /// Wire argument for this interval.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            LockInterval::Secs5 => "0005",
            LockInterval::Secs10 => "0010",
            LockInterval::Secs30 => "0030",
            LockInterval::Secs60 => "0060",
            LockInterval::Hour1 => "3600",
            LockInterval::Hour2 => "7200",
        }
    }

    /// Delay in seconds.
    #[must_use]
    pub fn seconds(&self) -> u32 {
        match self {
            LockInterval::Secs5 => 5,
            LockInterval::Secs10 => 10,
            LockInterval::Secs30 => 30,
            LockInterval::Secs60 => 60,
            LockInterval::Hour1 => 3600,
            LockInterval::Hour2 => 7200,
        }
    }

    /// Parse a wire argument back into an interval.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        LockInterval::ALL.into_iter().find(|i| i.code() == code)
    }
}

/// The fixed command set of the lock protocol.
///
/// # Examples
///
/// ```
/// use keyway_protocol::{LockCommand, LockInterval};
///
/// assert_eq!(LockCommand::Unlock.to_wire(), "unlock\n");
/// assert_eq!(
///     LockCommand::LockTimer(LockInterval::Secs30).to_wire(),
///     "locktimer 0030\n"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockCommand {
    Lock,
    Unlock,
    /// Enable serial reporting; sent once after connecting.
    EnableSerial,
    ModeAuto,
    ModeManual,
    /// Query the current output state.
    QueryState,
    /// Set the auto-relock delay.
    LockTimer(LockInterval),
}

impl LockCommand {
    /// The newline-terminated wire form.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            LockCommand::Lock => "lock\n".to_string(),
            LockCommand::Unlock => "unlock\n".to_string(),
            LockCommand::EnableSerial => "serial 1\n".to_string(),
            LockCommand::ModeAuto => "mode auto\n".to_string(),
            LockCommand::ModeManual => "mode manual\n".to_string(),
            LockCommand::QueryState => "outputstate\n".to_string(),
            LockCommand::LockTimer(interval) => format!("locktimer {}\n", interval.code()),
        }
    }
}

impl fmt::Display for LockCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_wire().trim_end())
    }
}

/// A state change recognized in the lock's free-text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReport {
    Locked,
    Unlocked,
}

impl LockReport {
    /// Scan a received chunk for a known status phrase.
    ///
    /// Chunk boundaries are not message boundaries, so this matches on
    /// substrings. Returns `None` for unrecognized text.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.contains("Device Unlocked") {
            Some(LockReport::Unlocked)
        } else if text.contains("Device Locked") {
            Some(LockReport::Locked)
        } else {
            None
        }
    }

    /// Whether the lock is engaged after this report.
    #[must_use]
    pub fn locked(&self) -> bool {
        matches!(self, LockReport::Locked)
    }
}
