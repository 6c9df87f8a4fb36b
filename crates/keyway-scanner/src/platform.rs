//! Radio-platform abstraction the scanner runs against.

#![allow(async_fn_in_trait)]

use std::io;
use tokio::sync::mpsc;

/// One LE advertisement as reported by the platform.
///
/// Name and address may be absent on some stacks; the scanner skips such
/// results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub name: Option<String>,
    pub address: Option<String>,
    pub payload: Vec<u8>,
}

/// One Classic device surfaced by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Platform capabilities the scanner needs.
///
/// The boolean probes answer synchronously and are consulted before any
/// radio operation. `start_advertisement_scan` streams advertisements
/// until `stop_advertisement_scan`; the platform closing that channel
/// early signals a failed scan. `start_discovery` streams Classic devices
/// and closes the channel when discovery finishes — early closure is the
/// normal end-of-discovery signal there.
pub trait RadioPlatform {
    fn radio_available(&self) -> bool;
    fn low_energy_available(&self) -> bool;
    fn radio_enabled(&self) -> bool;
    fn scan_permission_granted(&self) -> bool;
    fn location_permission_granted(&self) -> bool;
    fn location_enabled(&self) -> bool;
    fn power_save_active(&self) -> bool;

    async fn start_advertisement_scan(&mut self)
    -> io::Result<mpsc::UnboundedReceiver<Advertisement>>;
    fn stop_advertisement_scan(&mut self);
    async fn start_discovery(&mut self) -> io::Result<mpsc::UnboundedReceiver<DiscoveredDevice>>;
}
