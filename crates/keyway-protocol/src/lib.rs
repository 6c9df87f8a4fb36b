//! Command/response codecs for the supported peripheral families.
//!
//! Two wire protocols live here, both pure (no I/O):
//!
//! - [`door`] — the door/sensor unit's CRC-framed binary protocol:
//!   `password ++ opcode ++ payload? ++ crc8`, responses carrying a status
//!   byte and an echoed opcode.
//! - [`lock`] — the relock unit's line-oriented text protocol: a fixed set
//!   of newline-terminated ASCII commands and free-text responses matched
//!   by known status phrases.
//!
//! Framing and checksumming are the codec's job; moving bytes over a link
//! belongs to `keyway-link`.

pub mod crc;
pub mod door;
pub mod lock;

pub use crc::crc8;
pub use door::{DoorCodec, DoorOpcode, DoorStatus, TriggerReading};
pub use lock::{LockCommand, LockInterval, LockReport};
