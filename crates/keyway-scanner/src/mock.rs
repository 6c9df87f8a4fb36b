//! Fake radio platform for scanner tests.

use crate::platform::{Advertisement, DiscoveredDevice, RadioPlatform};
use std::io;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Shared {
    advertisement_scan_started: bool,
    advertisement_scan_stopped: bool,
    discovery_started: bool,
}

/// Scripted [`RadioPlatform`].
///
/// Precondition probes are plain public fields; scan results are queued
/// through the paired [`MockRadioHandle`] before or during a window.
#[derive(Debug)]
pub struct MockRadio {
    pub radio_available: bool,
    pub low_energy_available: bool,
    pub radio_enabled: bool,
    pub scan_permission: bool,
    pub location_permission: bool,
    pub location_enabled: bool,
    pub power_save: bool,
    pub fail_scan_start: bool,
    shared: Arc<Mutex<Shared>>,
    advertisements: Option<mpsc::UnboundedReceiver<Advertisement>>,
    discovered: Option<mpsc::UnboundedReceiver<DiscoveredDevice>>,
}

impl MockRadio {
    /// A radio with every capability present and every permission granted.
    pub fn ready() -> (Self, MockRadioHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let (adv_tx, adv_rx) = mpsc::unbounded_channel();
        let (disc_tx, disc_rx) = mpsc::unbounded_channel();
        let radio = MockRadio {
            radio_available: true,
            low_energy_available: true,
            radio_enabled: true,
            scan_permission: true,
            location_permission: true,
            location_enabled: true,
            power_save: false,
            fail_scan_start: false,
            shared: Arc::clone(&shared),
            advertisements: Some(adv_rx),
            discovered: Some(disc_rx),
        };
        let handle = MockRadioHandle {
            shared,
            adv_tx: Mutex::new(Some(adv_tx)),
            disc_tx: Mutex::new(Some(disc_tx)),
        };
        (radio, handle)
    }
}

impl RadioPlatform for MockRadio {
    fn radio_available(&self) -> bool {
        self.radio_available
    }

    fn low_energy_available(&self) -> bool {
        self.low_energy_available
    }

    fn radio_enabled(&self) -> bool {
        self.radio_enabled
    }

    fn scan_permission_granted(&self) -> bool {
        self.scan_permission
    }

    fn location_permission_granted(&self) -> bool {
        self.location_permission
    }

    fn location_enabled(&self) -> bool {
        self.location_enabled
    }

    fn power_save_active(&self) -> bool {
        self.power_save
    }

    async fn start_advertisement_scan(
        &mut self,
    ) -> io::Result<mpsc::UnboundedReceiver<Advertisement>> {
        if self.fail_scan_start {
            return Err(io::Error::other("scan rejected by radio"));
        }
        let Some(rx) = self.advertisements.take() else {
            return Err(io::Error::other("scan already started"));
        };
        self.shared.lock().unwrap().advertisement_scan_started = true;
        Ok(rx)
    }

    fn stop_advertisement_scan(&mut self) {
        self.shared.lock().unwrap().advertisement_scan_stopped = true;
    }

    async fn start_discovery(&mut self) -> io::Result<mpsc::UnboundedReceiver<DiscoveredDevice>> {
        if self.fail_scan_start {
            return Err(io::Error::other("discovery rejected by radio"));
        }
        let Some(rx) = self.discovered.take() else {
            return Err(io::Error::other("discovery already started"));
        };
        self.shared.lock().unwrap().discovery_started = true;
        Ok(rx)
    }
}

/// Test-side handle for a [`MockRadio`].
#[derive(Debug)]
pub struct MockRadioHandle {
    shared: Arc<Mutex<Shared>>,
    adv_tx: Mutex<Option<mpsc::UnboundedSender<Advertisement>>>,
    disc_tx: Mutex<Option<mpsc::UnboundedSender<DiscoveredDevice>>>,
}

impl MockRadioHandle {
    pub fn push_advertisement(&self, advertisement: Advertisement) {
        if let Some(tx) = self.adv_tx.lock().unwrap().as_ref() {
            let _ = tx.send(advertisement);
        }
    }

    pub fn push_discovered(&self, name: &str, address: &str) {
        if let Some(tx) = self.disc_tx.lock().unwrap().as_ref() {
            let _ = tx.send(DiscoveredDevice {
                name: Some(name.to_string()),
                address: Some(address.to_string()),
            });
        }
    }

    /// Close the discovery stream, as the platform does when discovery
    /// finishes on its own.
    pub fn finish_discovery(&self) {
        self.disc_tx.lock().unwrap().take();
    }

    /// Close the advertisement stream mid-window, as a platform abort does.
    pub fn abort_advertisement_scan(&self) {
        self.adv_tx.lock().unwrap().take();
    }

    pub fn advertisement_scan_started(&self) -> bool {
        self.shared.lock().unwrap().advertisement_scan_started
    }

    pub fn advertisement_scan_stopped(&self) -> bool {
        self.shared.lock().unwrap().advertisement_scan_stopped
    }
}
