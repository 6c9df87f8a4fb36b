//! Shared types for peripheral identity and link lifecycle.

use crate::constants::LE_LOCK_KEY_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized radio address.
///
/// Addresses arrive from the platform in mixed case with `:` or `-`
/// separators and sometimes surrounding whitespace. Wherever an address is
/// used as a lookup key it is normalized first: trimmed, separators
/// stripped, uppercased. Normalization is idempotent — constructing a
/// `DeviceAddress` from an already-normalized string is a no-op.
///
/// # Examples
///
/// ```
/// use keyway_core::DeviceAddress;
///
/// let addr = DeviceAddress::new(" aa:bb:CC:11:22:33 ");
/// assert_eq!(addr.as_str(), "AABBCC112233");
/// assert_eq!(DeviceAddress::new(addr.as_str()), addr);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Create a normalized address from a raw platform string.
    pub fn new(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        DeviceAddress(normalized)
    }

    /// Get the normalized address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceAddress {
    fn from(raw: &str) -> Self {
        DeviceAddress::new(raw)
    }
}

/// The two radio transports a peripheral can be reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Connectionless-advertisement link with a service/characteristic model.
    LowEnergy,
    /// Paired stream-socket link requiring a bond before data exchange.
    Classic,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportKind::LowEnergy => write!(f, "low-energy"),
            TransportKind::Classic => write!(f, "classic"),
        }
    }
}

/// Peripheral family tag.
///
/// Selects the command codec and the link-session variant for one
/// peripheral, so orchestration code is written once and parameterized by
/// family instead of duplicated per device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    /// Door/sensor unit: LE transport, CRC-framed binary protocol.
    Door,
    /// Relock unit over LE: LE transport, line-oriented text protocol.
    LockLe,
    /// Relock unit over Classic: stream socket, line-oriented text protocol.
    LockClassic,
}

impl DeviceFamily {
    /// The transport this family is reached over.
    #[must_use]
    pub fn transport(&self) -> TransportKind {
        match self {
            DeviceFamily::Door | DeviceFamily::LockLe => TransportKind::LowEnergy,
            DeviceFamily::LockClassic => TransportKind::Classic,
        }
    }

    /// The key under which a peripheral of this family appears in the
    /// authorized-device registry.
    ///
    /// LE locks are keyed with the [`LE_LOCK_KEY_PREFIX`]; door units and
    /// Classic locks use the bare normalized address.
    #[must_use]
    pub fn registry_key(&self, address: &DeviceAddress) -> String {
        match self {
            DeviceFamily::LockLe => format!("{}{}", LE_LOCK_KEY_PREFIX, address.as_str()),
            DeviceFamily::Door | DeviceFamily::LockClassic => address.as_str().to_string(),
        }
    }
}

/// A discovered peripheral candidate.
///
/// Created when a scan reports a device and discarded when the containing
/// result batch is cleared; connecting turns the handle's address into a
/// link session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralHandle {
    pub family: DeviceFamily,
    pub address: DeviceAddress,
    pub name: String,
}

impl PeripheralHandle {
    pub fn new(family: DeviceFamily, name: impl Into<String>, address: &str) -> Self {
        PeripheralHandle {
            family,
            address: DeviceAddress::new(address),
            name: name.into(),
        }
    }
}

impl fmt::Display for PeripheralHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Lifecycle state of one link session.
///
/// One session owns exactly one peripheral and exactly one state at a time.
/// `AwaitingBond` occurs only on the Classic transport, while a bonding
/// request is pending user/peripheral confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Disconnected,
    Connecting,
    AwaitingBond,
    Ready,
    Disconnecting,
}

impl LinkState {
    /// Whether the session can accept a `send` in this state.
    #[must_use]
    pub fn can_send(&self) -> bool {
        matches!(self, LinkState::Ready)
    }

    /// Whether a connect attempt may begin from this state.
    #[must_use]
    pub fn can_connect(&self) -> bool {
        matches!(self, LinkState::Disconnected)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::AwaitingBond => "awaiting-bond",
            LinkState::Ready => "ready",
            LinkState::Disconnecting => "disconnecting",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(" aa:bb:CC:11:22:33 ", "AABBCC112233")]
    #[case("AABBCC112233", "AABBCC112233")]
    #[case("aa-bb-cc-11-22-33", "AABBCC112233")]
    #[case("", "")]
    fn test_address_normalization(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(DeviceAddress::new(raw).as_str(), expected);
    }

    #[test]
    fn test_address_normalization_is_idempotent() {
        let once = DeviceAddress::new(" aa:bb:CC:11:22:33 ");
        let twice = DeviceAddress::new(once.as_str());
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case(DeviceFamily::Door, TransportKind::LowEnergy)]
    #[case(DeviceFamily::LockLe, TransportKind::LowEnergy)]
    #[case(DeviceFamily::LockClassic, TransportKind::Classic)]
    fn test_family_transport(#[case] family: DeviceFamily, #[case] transport: TransportKind) {
        assert_eq!(family.transport(), transport);
    }

    #[test]
    fn test_registry_key_prefixes_le_locks_only() {
        let addr = DeviceAddress::new("aa:bb:cc:11:22:33");
        assert_eq!(DeviceFamily::Door.registry_key(&addr), "AABBCC112233");
        assert_eq!(DeviceFamily::LockClassic.registry_key(&addr), "AABBCC112233");
        assert_eq!(DeviceFamily::LockLe.registry_key(&addr), "ANT-AABBCC112233");
    }

    #[test]
    fn test_link_state_gates() {
        assert!(LinkState::Ready.can_send());
        assert!(!LinkState::Connecting.can_send());
        assert!(LinkState::Disconnected.can_connect());
        assert!(!LinkState::Ready.can_connect());
    }
}
