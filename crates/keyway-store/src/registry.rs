//! Registration state layered on the settings store.

use crate::store::SettingsStore;
use chrono::{DateTime, TimeZone, Utc};
use keyway_core::{DeviceAddress, DeviceFamily, Error, PeripheralHandle, Result};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Storage keys used by the registry.
pub mod keys {
    pub const CLIENT_TOKEN: &str = "CLIENT_TOKEN";
    pub const CLIENT_DEVICES: &str = "CLIENT_DEVICES";
    pub const DEVICE_ADDRESS: &str = "DATA_DEVICE_ADDRESS";
    pub const DEVICE_NAME: &str = "DATA_DEVICE_NAME";
    pub const DEVICE_FAMILY: &str = "DATA_DEVICE_FAMILY";
    pub const LAST_SYNC_TIME: &str = "LAST_SYNC_TIME";
}

/// Authorized peripherals and client registration state.
///
/// Peripherals are stored as registry keys — normalized addresses, with
/// the `ANT-` prefix for LE locks — in a JSON array under one settings
/// key. Registering a peripheral requires decrypting its provisioning
/// token first; a token that fails to decrypt registers nothing.
pub struct DeviceRegistry<S: SettingsStore> {
    store: S,
}

impl<S: SettingsStore> DeviceRegistry<S> {
    pub fn new(store: S) -> Self {
        DeviceRegistry { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // -- client token -------------------------------------------------------

    pub fn client_id(&self) -> Option<String> {
        self.store.get(keys::CLIENT_TOKEN)
    }

    pub fn set_client_id(&mut self, id: &str) {
        self.store.set(keys::CLIENT_TOKEN, id);
    }

    pub fn clear_client_id(&mut self) {
        self.store.clear(keys::CLIENT_TOKEN);
    }

    // -- authorized devices -------------------------------------------------

    /// The registered device keys, sorted.
    pub fn authorized_devices(&self) -> BTreeSet<String> {
        let Some(raw) = self.store.get(keys::CLIENT_DEVICES) else {
            return BTreeSet::new();
        };
        match serde_json::from_str(&raw) {
            Ok(devices) => devices,
            Err(err) => {
                warn!(error = %err, "authorized-device list is corrupt, treating as empty");
                BTreeSet::new()
            }
        }
    }

    /// Add one device key to the authorized set.
    pub fn register(&mut self, device_key: &str) {
        let mut devices = self.authorized_devices();
        if devices.insert(device_key.to_string()) {
            debug!(device = %device_key, "device registered");
        }
        self.persist(&devices);
    }

    /// Decrypt a provisioning token against the stored client id and
    /// register the device it names.
    ///
    /// A token that fails to decrypt — or a registry with no client id —
    /// yields [`Error::InvalidToken`] and registers nothing: a rejected
    /// token never partially registers a device.
    pub fn provision(&mut self, token: &str, shared_secret: &str) -> Result<String> {
        let client_id = self.client_id().ok_or(Error::InvalidToken)?;
        let device_key = keyway_auth::decrypt_token(token, shared_secret, &client_id)?;
        self.register(&device_key);
        Ok(device_key)
    }

    /// Whether a peripheral of the given family is registered.
    pub fn is_authorized(&self, family: DeviceFamily, address: &DeviceAddress) -> bool {
        self.authorized_devices()
            .contains(&family.registry_key(address))
    }

    fn persist(&mut self, devices: &BTreeSet<String>) {
        match serde_json::to_string(devices) {
            Ok(encoded) => self.store.set(keys::CLIENT_DEVICES, &encoded),
            Err(err) => warn!(error = %err, "could not encode authorized-device list"),
        }
    }

    // -- last device --------------------------------------------------------

    /// Remember the device a session was last established with, so the
    /// orchestrator can offer a reconnect without a fresh scan.
    pub fn remember_device(&mut self, device: &PeripheralHandle) {
        self.store.set(keys::DEVICE_NAME, &device.name);
        self.store.set(keys::DEVICE_ADDRESS, device.address.as_str());
        match serde_json::to_string(&device.family) {
            Ok(family) => self.store.set(keys::DEVICE_FAMILY, &family),
            Err(err) => warn!(error = %err, "could not encode device family"),
        }
    }

    pub fn last_device(&self) -> Option<PeripheralHandle> {
        let name = self.store.get(keys::DEVICE_NAME)?;
        let address = self.store.get(keys::DEVICE_ADDRESS)?;
        let family = serde_json::from_str(&self.store.get(keys::DEVICE_FAMILY)?).ok()?;
        Some(PeripheralHandle::new(family, name, &address))
    }

    pub fn forget_device(&mut self) {
        self.store.clear(keys::DEVICE_NAME);
        self.store.clear(keys::DEVICE_ADDRESS);
        self.store.clear(keys::DEVICE_FAMILY);
    }

    // -- sync time ----------------------------------------------------------

    pub fn record_sync_time(&mut self, unix_ms: i64) {
        self.store.set(keys::LAST_SYNC_TIME, &unix_ms.to_string());
    }

    pub fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get(keys::LAST_SYNC_TIME)?;
        let millis: i64 = raw.parse().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}
