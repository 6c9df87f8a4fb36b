//! The transport scanner.

use crate::platform::RadioPlatform;
use keyway_core::constants::{
    CLASSIC_LOCK_NAME_PREFIX, LE_SCAN_WINDOW, starts_with_advertisement_header,
};
use keyway_core::{Error, Result};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Discovery results and window lifecycle, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// An LE peripheral whose advertisement carries the expected header.
    FoundDevice {
        name: String,
        address: String,
        advertisement: Vec<u8>,
    },
    /// A Classic peripheral whose name follows the lock naming convention.
    FoundClassicDevice { name: String, address: String },
    /// The scan window ended — by timeout, by the platform finishing, or
    /// by an error that pre-empted the scan. Exactly once per window.
    FinishSearch,
    /// A failure after the window opened.
    Failed(Error),
}

/// Discovers candidate peripherals over both transports.
///
/// Results are de-duplicated by name within one scan window; a fresh call
/// starts a fresh batch.
pub struct TransportScanner<P: RadioPlatform> {
    platform: P,
    events: mpsc::UnboundedSender<ScanEvent>,
    scan_window: Duration,
}

impl<P: RadioPlatform> TransportScanner<P> {
    pub fn new(platform: P) -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        Self::with_window(platform, LE_SCAN_WINDOW)
    }

    /// Scanner with a custom window; tests shrink it.
    pub fn with_window(
        platform: P,
        scan_window: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            TransportScanner {
                platform,
                events,
                scan_window,
            },
            rx,
        )
    }

    /// Scan for LE peripherals advertising the expected header.
    ///
    /// All preconditions are verified synchronously first; the first
    /// failure is returned immediately, no scan starts, and no events are
    /// emitted for the call. On success the window runs its fixed
    /// duration and ends in exactly one [`ScanEvent::FinishSearch`].
    pub async fn search_advertising(&mut self) -> Result<()> {
        self.check_preconditions(true)?;

        let mut results = match self.platform.start_advertisement_scan().await {
            Ok(rx) => rx,
            Err(err) => {
                warn!(error = %err, "advertisement scan failed to start");
                self.emit(ScanEvent::Failed(Error::ScanFailed));
                self.emit(ScanEvent::FinishSearch);
                return Ok(());
            }
        };

        let deadline = Instant::now() + self.scan_window;
        let mut batch = HashSet::new();
        loop {
            match tokio::time::timeout_at(deadline, results.recv()).await {
                Err(_) => break, // window elapsed
                Ok(None) => {
                    // The platform gave up before the window closed.
                    self.emit(ScanEvent::Failed(Error::ScanFailed));
                    break;
                }
                Ok(Some(adv)) => {
                    let (Some(name), Some(address)) = (adv.name, adv.address) else {
                        continue;
                    };
                    if !starts_with_advertisement_header(&adv.payload) {
                        continue;
                    }
                    if !batch.insert(name.clone()) {
                        continue;
                    }
                    debug!(%name, %address, "advertisement matched");
                    self.emit(ScanEvent::FoundDevice {
                        name,
                        address,
                        advertisement: adv.payload,
                    });
                }
            }
        }

        self.platform.stop_advertisement_scan();
        self.emit(ScanEvent::FinishSearch);
        Ok(())
    }

    /// Discover Classic peripherals following the lock naming convention.
    ///
    /// Same precondition ladder as [`search_advertising`] minus the LE
    /// capability. The window ends when discovery finishes or the window
    /// duration elapses, whichever comes first.
    ///
    /// [`search_advertising`]: TransportScanner::search_advertising
    pub async fn search_classic(&mut self) -> Result<()> {
        self.check_preconditions(false)?;

        let mut results = match self.platform.start_discovery().await {
            Ok(rx) => rx,
            Err(err) => {
                warn!(error = %err, "classic discovery failed to start");
                self.emit(ScanEvent::Failed(Error::ScanFailed));
                self.emit(ScanEvent::FinishSearch);
                return Ok(());
            }
        };

        let deadline = Instant::now() + self.scan_window;
        let mut batch = HashSet::new();
        loop {
            match tokio::time::timeout_at(deadline, results.recv()).await {
                Err(_) => break,          // window elapsed
                Ok(None) => break,        // discovery finished
                Ok(Some(device)) => {
                    let (Some(name), Some(address)) = (device.name, device.address) else {
                        continue;
                    };
                    if !name.starts_with(CLASSIC_LOCK_NAME_PREFIX) {
                        continue;
                    }
                    if !batch.insert(name.clone()) {
                        continue;
                    }
                    debug!(%name, %address, "classic device matched");
                    self.emit(ScanEvent::FoundClassicDevice { name, address });
                }
            }
        }

        self.emit(ScanEvent::FinishSearch);
        Ok(())
    }

    /// The precondition ladder, in checking order. The first failure wins.
    fn check_preconditions(&self, low_energy: bool) -> Result<()> {
        if !self.platform.radio_available() {
            return Err(Error::RadioUnavailable);
        }
        if low_energy && !self.platform.low_energy_available() {
            return Err(Error::LowEnergyUnavailable);
        }
        if !self.platform.radio_enabled() {
            return Err(Error::RadioStateError);
        }
        if !self.platform.scan_permission_granted() {
            return Err(Error::ScanPermissionDenied);
        }
        if !self.platform.location_permission_granted() {
            return Err(Error::LocationPermissionDenied);
        }
        if self.platform.power_save_active() {
            return Err(Error::PowerSaveModeActive);
        }
        if !self.platform.location_enabled() {
            return Err(Error::LocationDisabled);
        }
        Ok(())
    }

    fn emit(&self, event: ScanEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRadio;
    use keyway_core::constants::ADVERTISEMENT_HEADER;

    fn adv(name: &str, address: &str, payload: Vec<u8>) -> crate::platform::Advertisement {
        crate::platform::Advertisement {
            name: Some(name.to_string()),
            address: Some(address.to_string()),
            payload,
        }
    }

    fn header_payload(extra: &[u8]) -> Vec<u8> {
        let mut payload = ADVERTISEMENT_HEADER.to_vec();
        payload.extend_from_slice(extra);
        payload
    }

    fn short_window<P: RadioPlatform>(
        platform: P,
    ) -> (TransportScanner<P>, mpsc::UnboundedReceiver<ScanEvent>) {
        TransportScanner::with_window(platform, Duration::from_millis(50))
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn advertising_reports_matching_devices_and_finishes_once() {
        let (radio, handle) = MockRadio::ready();
        handle.push_advertisement(adv("TSR1-B 01", "AA:BB:CC:11:22:33", header_payload(&[1])));
        handle.push_advertisement(adv("GENERIC", "11:11:11:11:11:11", vec![0x00, 0x01]));
        handle.push_advertisement(adv("TSR1-B 02", "AA:BB:CC:11:22:44", header_payload(&[2])));

        let (mut scanner, rx) = short_window(radio);
        scanner.search_advertising().await.unwrap();

        let events = drain(rx);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ScanEvent::FoundDevice { name, .. } if name == "TSR1-B 01"));
        assert!(matches!(&events[1], ScanEvent::FoundDevice { name, .. } if name == "TSR1-B 02"));
        assert_eq!(events[2], ScanEvent::FinishSearch);
        assert!(handle.advertisement_scan_stopped());
    }

    #[tokio::test]
    async fn advertising_deduplicates_by_name_within_a_batch() {
        let (radio, handle) = MockRadio::ready();
        handle.push_advertisement(adv("TSR1-B 01", "AA:BB:CC:11:22:33", header_payload(&[])));
        handle.push_advertisement(adv("TSR1-B 01", "AA:BB:CC:11:22:33", header_payload(&[])));
        handle.push_advertisement(adv("TSR1-B 01", "AA:BB:CC:11:22:99", header_payload(&[])));

        let (mut scanner, rx) = short_window(radio);
        scanner.search_advertising().await.unwrap();

        let events = drain(rx);
        let found = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::FoundDevice { .. }))
            .count();
        assert_eq!(found, 1);
    }

    #[tokio::test]
    async fn advertising_skips_nameless_results() {
        let (radio, handle) = MockRadio::ready();
        handle.push_advertisement(crate::platform::Advertisement {
            name: None,
            address: Some("AA:BB:CC:11:22:33".into()),
            payload: header_payload(&[]),
        });

        let (mut scanner, rx) = short_window(radio);
        scanner.search_advertising().await.unwrap();
        assert_eq!(drain(rx), vec![ScanEvent::FinishSearch]);
    }

    #[tokio::test]
    async fn location_disabled_fails_immediately_with_no_events() {
        let (mut radio, handle) = MockRadio::ready();
        radio.location_enabled = false;

        let (mut scanner, rx) = short_window(radio);
        assert_eq!(
            scanner.search_advertising().await,
            Err(Error::LocationDisabled)
        );
        assert!(drain(rx).is_empty());
        assert!(!handle.advertisement_scan_started());
    }

    #[tokio::test]
    async fn precondition_ladder_reports_first_failure() {
        let cases: [(fn(&mut MockRadio), Error); 6] = [
            (|r| r.radio_available = false, Error::RadioUnavailable),
            (|r| r.low_energy_available = false, Error::LowEnergyUnavailable),
            (|r| r.radio_enabled = false, Error::RadioStateError),
            (|r| r.scan_permission = false, Error::ScanPermissionDenied),
            (|r| r.location_permission = false, Error::LocationPermissionDenied),
            (|r| r.power_save = true, Error::PowerSaveModeActive),
        ];
        for (break_radio, expected) in cases {
            let (mut radio, _handle) = MockRadio::ready();
            break_radio(&mut radio);
            let (mut scanner, rx) = short_window(radio);
            assert_eq!(scanner.search_advertising().await, Err(expected));
            assert!(drain(rx).is_empty());
        }
    }

    #[tokio::test]
    async fn classic_search_skips_low_energy_capability_check() {
        let (mut radio, handle) = MockRadio::ready();
        radio.low_energy_available = false;
        handle.push_discovered("ELOCK-01", "AA:BB:CC:11:22:33");
        handle.finish_discovery();

        let (mut scanner, rx) = short_window(radio);
        scanner.search_classic().await.unwrap();

        let events = drain(rx);
        assert_eq!(events.len(), 2);
        assert!(
            matches!(&events[0], ScanEvent::FoundClassicDevice { name, .. } if name == "ELOCK-01")
        );
        assert_eq!(events[1], ScanEvent::FinishSearch);
    }

    #[tokio::test]
    async fn classic_search_filters_on_name_prefix() {
        let (radio, handle) = MockRadio::ready();
        handle.push_discovered("ELOCK-01", "AA:BB:CC:11:22:33");
        handle.push_discovered("HEADSET", "22:22:22:22:22:22");
        handle.push_discovered("ELOCK-02", "AA:BB:CC:11:22:44");
        handle.finish_discovery();

        let (mut scanner, rx) = short_window(radio);
        scanner.search_classic().await.unwrap();

        let found: Vec<_> = drain(rx)
            .into_iter()
            .filter_map(|e| match e {
                ScanEvent::FoundClassicDevice { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(found, vec!["ELOCK-01", "ELOCK-02"]);
    }

    #[tokio::test]
    async fn classic_discovery_finished_signal_ends_the_window() {
        let (radio, handle) = MockRadio::ready();
        handle.finish_discovery();

        // A window far longer than the test: the finished signal must end it.
        let (mut scanner, rx) = TransportScanner::with_window(radio, Duration::from_secs(60));
        scanner.search_classic().await.unwrap();
        assert_eq!(drain(rx), vec![ScanEvent::FinishSearch]);
    }

    #[tokio::test]
    async fn failed_scan_start_still_finishes_exactly_once() {
        let (mut radio, _handle) = MockRadio::ready();
        radio.fail_scan_start = true;

        let (mut scanner, rx) = short_window(radio);
        scanner.search_advertising().await.unwrap();
        assert_eq!(
            drain(rx),
            vec![ScanEvent::Failed(Error::ScanFailed), ScanEvent::FinishSearch]
        );
    }

    #[tokio::test]
    async fn aborted_scan_reports_failure_and_finishes_once() {
        let (radio, handle) = MockRadio::ready();
        handle.push_advertisement(adv("TSR1-B 01", "AA:BB:CC:11:22:33", header_payload(&[])));
        handle.abort_advertisement_scan();

        let (mut scanner, rx) = TransportScanner::with_window(radio, Duration::from_secs(60));
        scanner.search_advertising().await.unwrap();

        let events = drain(rx);
        assert_eq!(
            events.last(),
            Some(&ScanEvent::FinishSearch),
            "window must end in FinishSearch"
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == ScanEvent::FinishSearch)
                .count(),
            1
        );
        assert!(events.contains(&ScanEvent::Failed(Error::ScanFailed)));
    }
}
