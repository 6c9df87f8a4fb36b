//! Protocol-level constants shared across the workspace.
//!
//! These values identify the supported peripheral families on the air and
//! parameterize the command codecs and the authorization gate. They are
//! fixed by the deployed peripheral firmware; changing them breaks
//! compatibility with units already in the field.

use std::time::Duration;
use uuid::{Uuid, uuid};

// ============================================================================
// GATT identifiers
// ============================================================================

/// Control service exposed by LE peripherals (door unit and LE lock).
pub const CONTROL_SERVICE_UUID: Uuid = uuid!("27760001-999c-4d6a-9fc4-c7272be10900");

/// Control characteristic within [`CONTROL_SERVICE_UUID`].
///
/// All framed commands are written here and all notifications arrive here;
/// a peripheral missing either the service or this characteristic is not a
/// supported unit and the session fails terminally.
pub const CONTROL_CHARACTERISTIC_UUID: Uuid = uuid!("27763561-999c-4d6a-9fc4-c7272be10900");

/// Standard Serial Port Profile UUID used for the Classic stream socket.
pub const SPP_UUID: Uuid = uuid!("00001101-0000-1000-8000-00805f9b34fb");

// ============================================================================
// Discovery
// ============================================================================

/// Fixed 6-byte prefix identifying a supported unit's advertisement payload.
///
/// Advertisements that do not start with this header are ignored during a
/// scan window.
pub const ADVERTISEMENT_HEADER: [u8; 6] = [0x12, 0x16, 0xFF, 0xBF, 0x0E, 0x05];

/// Duration of one LE advertisement scan window.
pub const LE_SCAN_WINDOW: Duration = Duration::from_secs(10);

/// Name prefix that identifies a Classic relock unit during discovery.
pub const CLASSIC_LOCK_NAME_PREFIX: &str = "ELOCK";

/// Registry-key prefix for LE relock units.
///
/// LE locks are stored in the authorized-device set under
/// `ANT-<normalized address>`; door units and Classic locks use the bare
/// normalized address.
pub const LE_LOCK_KEY_PREFIX: &str = "ANT-";

/// Check whether an advertisement payload starts with
/// [`ADVERTISEMENT_HEADER`].
///
/// # Examples
///
/// ```
/// use keyway_core::constants::{ADVERTISEMENT_HEADER, starts_with_advertisement_header};
///
/// let mut payload = ADVERTISEMENT_HEADER.to_vec();
/// payload.extend_from_slice(&[0xAA, 0xBB]);
/// assert!(starts_with_advertisement_header(&payload));
/// assert!(!starts_with_advertisement_header(&[0x12, 0x16]));
/// ```
pub fn starts_with_advertisement_header(payload: &[u8]) -> bool {
    payload.len() >= ADVERTISEMENT_HEADER.len() && payload[..ADVERTISEMENT_HEADER.len()] == ADVERTISEMENT_HEADER
}

// ============================================================================
// Door frame protocol
// ============================================================================

/// Factory password of the door/sensor unit.
///
/// Prepended to every outgoing door frame; the unit rejects frames carrying
/// a different password with status 0x01.
pub const DEFAULT_DOOR_PASSWORD: &str = "654321";

// ============================================================================
// Authorization
// ============================================================================

/// Width of one TOTP validity window, in seconds.
pub const TOTP_STEP_SECONDS: u64 = 30;

/// Number of decimal digits in an authorization token.
pub const TOTP_DIGITS: usize = 6;

/// Largest tolerated offset between server and device clocks, in
/// milliseconds, before locally generated tokens must be considered
/// untrustworthy.
pub const CLOCK_SYNC_MARGIN_MS: i64 = 5000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_prefix_match() {
        assert!(starts_with_advertisement_header(&[0x12, 0x16, 0xFF, 0xBF, 0x0E, 0x05]));
        assert!(starts_with_advertisement_header(&[
            0x12, 0x16, 0xFF, 0xBF, 0x0E, 0x05, 0x00, 0x01
        ]));
    }

    #[test]
    fn test_header_rejects_short_or_mismatched_payloads() {
        assert!(!starts_with_advertisement_header(&[]));
        assert!(!starts_with_advertisement_header(&[0x12, 0x16, 0xFF, 0xBF, 0x0E]));
        assert!(!starts_with_advertisement_header(&[0x13, 0x16, 0xFF, 0xBF, 0x0E, 0x05]));
    }
}
