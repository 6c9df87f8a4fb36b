//! Injected settings storage and the device registry built on it.
//!
//! The core never touches global storage. Whatever persistence the
//! application uses is injected through [`SettingsStore`] — a plain
//! get/set/clear seam owned by the orchestrator — and the
//! [`DeviceRegistry`] layers the registration state on top of it: the
//! provisioned client token, the set of authorized peripherals, the last
//! connected device, and the last clock-sync time.

pub mod registry;
pub mod store;

pub use registry::{DeviceRegistry, keys};
pub use store::{MemoryStore, SettingsStore};
