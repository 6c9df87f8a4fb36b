//! Binary frame codec for the door/sensor unit.
//!
//! # Wire Format
//!
//! Every outgoing command is one frame:
//!
//! ```text
//! password bytes ++ opcode ++ payload? ++ crc8(password ++ opcode ++ payload?)
//! ```
//!
//! With the factory password `"654321"`, opcode `0x6C` and payload `[0x01]`
//! the frame on the air is:
//!
//! ```text
//! 36 35 34 33 32 31 6C 01 69
//! ^^^^^^^^^^^^^^^^^ ^^ ^^ ^^
//! password          op payload crc
//! ```
//!
//! Responses start with a status byte (`0x00` = success) followed by the
//! echoed opcode; a trigger report (`0x6D`) carries the trigger flag in the
//! third byte. Failure statuses are reported as values, never as errors —
//! a bad status is a protocol outcome, not a fault in this codec. Incoming
//! frames are not CRC-checked; checksums are computed on the outgoing path
//! only.
//!
//! # Examples
//!
//! ```
//! use keyway_protocol::{DoorCodec, DoorOpcode, DoorStatus, TriggerReading};
//!
//! let codec = DoorCodec::with_default_password();
//! let frame = codec.set_trigger(true);
//! assert_eq!(&frame[..], &[0x36, 0x35, 0x34, 0x33, 0x32, 0x31, 0x6C, 0x01, 0x69]);
//!
//! // Peripheral reports: success, trigger active.
//! let response = [0x00, 0x6D, 0x01];
//! assert_eq!(DoorStatus::of_response(&response), DoorStatus::Success);
//! assert_eq!(TriggerReading::decode(&response), TriggerReading::Triggered);
//! ```

use crate::crc::crc8;
use bytes::{BufMut, Bytes, BytesMut};
use keyway_core::constants::DEFAULT_DOOR_PASSWORD;
use serde::{Deserialize, Serialize};

/// Operations understood by the door unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorOpcode {
    /// Set the trigger output; payload is one byte, `0x01` open / `0x00` close.
    SetTrigger,
    /// Read the current trigger state; no payload.
    ReadTrigger,
}

impl DoorOpcode {
    /// Wire value of the opcode byte.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        match self {
            DoorOpcode::SetTrigger => 0x6C,
            DoorOpcode::ReadTrigger => 0x6D,
        }
    }

    /// Parse a wire opcode byte.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x6C => Some(DoorOpcode::SetTrigger),
            0x6D => Some(DoorOpcode::ReadTrigger),
            _ => None,
        }
    }
}

/// Status byte of a door response.
///
/// `0x00` is success; every other value (and the empty response) is a
/// defined failure. The names for 0x01–0x06 come from the unit's protocol
/// documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorStatus {
    Success,
    PasswordError,
    CrcError,
    InvalidOperation,
    FormatError,
    ValueError,
    Unsupported,
    /// The peripheral sent back zero bytes.
    Empty,
    /// A status byte outside the documented set.
    Unknown(u8),
}

impl DoorStatus {
    /// Interpret a raw status byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => DoorStatus::Success,
            0x01 => DoorStatus::PasswordError,
            0x02 => DoorStatus::CrcError,
            0x03 => DoorStatus::InvalidOperation,
            0x04 => DoorStatus::FormatError,
            0x05 => DoorStatus::ValueError,
            0x06 => DoorStatus::Unsupported,
            other => DoorStatus::Unknown(other),
        }
    }

    /// Status of a whole response: the first byte, or [`DoorStatus::Empty`]
    /// for a zero-length response.
    #[must_use]
    pub fn of_response(response: &[u8]) -> Self {
        match response.first() {
            Some(byte) => DoorStatus::from_byte(*byte),
            None => DoorStatus::Empty,
        }
    }

    /// Wire value reported for this status.
    ///
    /// [`DoorStatus::Empty`] maps to the defined error code `0x08`.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        match self {
            DoorStatus::Success => 0x00,
            DoorStatus::PasswordError => 0x01,
            DoorStatus::CrcError => 0x02,
            DoorStatus::InvalidOperation => 0x03,
            DoorStatus::FormatError => 0x04,
            DoorStatus::ValueError => 0x05,
            DoorStatus::Unsupported => 0x06,
            DoorStatus::Empty => 0x08,
            DoorStatus::Unknown(code) => *code,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, DoorStatus::Success)
    }
}

/// Decoded trigger report.
///
/// The semantic closed/off indication is the logical negation of the
/// trigger flag. A failed status or a response too short to carry the flag
/// decodes to [`TriggerReading::Unknown`], which must cause no state
/// change — never "not triggered".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReading {
    Triggered,
    Clear,
    Unknown,
}

impl TriggerReading {
    /// Decode a response to a [`DoorOpcode::ReadTrigger`] query.
    #[must_use]
    pub fn decode(response: &[u8]) -> Self {
        if !DoorStatus::of_response(response).is_success() {
            return TriggerReading::Unknown;
        }
        if response.len() < 3 {
            return TriggerReading::Unknown;
        }
        if response[2] != 0x00 {
            TriggerReading::Triggered
        } else {
            TriggerReading::Clear
        }
    }

    /// The semantic closed/off state, if known.
    #[must_use]
    pub fn closed(&self) -> Option<bool> {
        match self {
            TriggerReading::Triggered => Some(false),
            TriggerReading::Clear => Some(true),
            TriggerReading::Unknown => None,
        }
    }
}

/// Frame encoder for one door unit, bound to its password.
#[derive(Debug, Clone)]
pub struct DoorCodec {
    password: Vec<u8>,
}

impl DoorCodec {
    pub fn new(password: impl Into<String>) -> Self {
        DoorCodec {
            password: password.into().into_bytes(),
        }
    }

    /// Codec using the factory password.
    #[must_use]
    pub fn with_default_password() -> Self {
        DoorCodec::new(DEFAULT_DOOR_PASSWORD)
    }

    /// Assemble `password ++ opcode ++ payload ++ crc8(covered)`.
    ///
    /// The checksum covers everything before it and never itself.
    #[must_use]
    pub fn encode(&self, opcode: DoorOpcode, payload: &[u8]) -> Bytes {
        let mut frame = BytesMut::with_capacity(self.password.len() + 1 + payload.len() + 1);
        frame.put_slice(&self.password);
        frame.put_u8(opcode.as_u8());
        frame.put_slice(payload);
        let checksum = crc8(&frame);
        frame.put_u8(checksum);
        frame.freeze()
    }

    /// Command frame driving the trigger output: `true` opens, `false`
    /// closes.
    #[must_use]
    pub fn set_trigger(&self, open: bool) -> Bytes {
        self.encode(DoorOpcode::SetTrigger, &[if open { 0x01 } else { 0x00 }])
    }

    /// Query frame for the current trigger state.
    #[must_use]
    pub fn read_trigger(&self) -> Bytes {
        self.encode(DoorOpcode::ReadTrigger, &[])
    }

    /// Whether an incoming response is a trigger report addressed to the
    /// [`DoorOpcode::ReadTrigger`] query.
    ///
    /// Responses echo the opcode in their second byte; that byte routes the
    /// report, since notifications for different queries share one
    /// characteristic.
    #[must_use]
    pub fn is_trigger_report(response: &[u8]) -> bool {
        response.len() > 2 && response[1] == DoorOpcode::ReadTrigger.as_u8()
    }
}
