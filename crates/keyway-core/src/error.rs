//! Stable error enumeration for the connectivity core.
//!
//! Every failure that crosses a crate boundary in this workspace is one of
//! these codes. Platform faults (`std::io::Error` from a transport
//! implementation) are converted at the link-session and scanner boundaries;
//! callers above those boundaries never observe a platform-native error type.
//!
//! The set is closed: orchestration layers map each code to user-facing
//! messaging and remediation, so adding or renaming variants is a breaking
//! change for every embedder.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Error {
    // Connection lifecycle
    #[error("connection attempt failed")]
    ConnectionFailed,

    #[error("disconnection did not complete cleanly")]
    DisconnectionFailed,

    #[error("peripheral is not connected")]
    NotConnected,

    #[error("peripheral address is unknown to the radio")]
    NoDevice,

    // Scanning
    #[error("scan could not be started or aborted")]
    ScanFailed,

    // Radio capability and preconditions
    #[error("radio hardware is unavailable")]
    RadioUnavailable,

    #[error("low-energy transport is unavailable")]
    LowEnergyUnavailable,

    #[error("radio reported an invalid state")]
    RadioStateError,

    #[error("bluetooth permission denied")]
    BluetoothPermissionDenied,

    #[error("scan permission denied")]
    ScanPermissionDenied,

    #[error("location permission denied")]
    LocationPermissionDenied,

    #[error("power-save mode is active")]
    PowerSaveModeActive,

    #[error("location services are disabled")]
    LocationDisabled,

    // GATT resolution
    #[error("control service not found on peripheral")]
    ServiceNotFound,

    #[error("control characteristic not found on peripheral")]
    CharacteristicNotFound,

    // Active-session I/O
    #[error("read from peripheral failed")]
    ReadFailed,

    #[error("send to peripheral failed")]
    SendFailed,

    // Credential material
    #[error("invalid token")]
    InvalidToken,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages_are_stable() {
        assert_eq!(Error::ConnectionFailed.to_string(), "connection attempt failed");
        assert_eq!(Error::InvalidToken.to_string(), "invalid token");
        assert_eq!(
            Error::CharacteristicNotFound.to_string(),
            "control characteristic not found on peripheral"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&Error::LocationDisabled).unwrap();
        assert_eq!(json, "\"location_disabled\"");
        let back: Error = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Error::LocationDisabled);
    }
}
