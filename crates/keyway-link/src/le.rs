//! LE-GATT link session.
//!
//! Lifecycle: `Disconnected → Connecting → Ready → Disconnecting →
//! Disconnected`. The session is a synchronous state machine; the platform
//! feeds it [`GattEvent`]s (directly, or through [`LeLinkSession::pump`]
//! on one coordinating task) and it reacts by invoking [`GattTransport`]
//! commands and publishing [`LinkEvent`]s.
//!
//! Failing to resolve the control service or characteristic is terminal
//! for the session: no retry, and every later `send` keeps rejecting.

use crate::events::LinkEvent;
use crate::traits::{GattEvent, GattTransport, map_io_error};
use keyway_core::constants::{CONTROL_CHARACTERISTIC_UUID, CONTROL_SERVICE_UUID};
use keyway_core::{DeviceAddress, Error, LinkState, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct LeLinkSession<T: GattTransport> {
    transport: T,
    address: DeviceAddress,
    state: LinkState,
    events: mpsc::UnboundedSender<LinkEvent>,
}

impl<T: GattTransport> LeLinkSession<T> {
    /// Create a session for one peripheral; the receiver carries the
    /// session's upward events.
    pub fn new(transport: T, address: DeviceAddress) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = LeLinkSession {
            transport,
            address,
            state: LinkState::Disconnected,
            events,
        };
        (session, rx)
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Begin the asynchronous handshake.
    ///
    /// Completion arrives as transport events: `Connected`, then service
    /// resolution, then `Ready`. An error here means the attempt could not
    /// even start.
    pub fn connect(&mut self) -> Result<()> {
        if !self.state.can_connect() {
            return Err(Error::ConnectionFailed);
        }
        debug!(address = %self.address, "starting LE handshake");
        self.transport
            .connect(&self.address)
            .map_err(|err| map_io_error(&err, Error::ConnectionFailed))?;
        self.state = LinkState::Connecting;
        Ok(())
    }

    /// Write one frame to the control characteristic.
    ///
    /// Rejected with `CharacteristicNotFound` before the session is
    /// `Ready` — including after a terminal resolution failure.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if !self.state.can_send() {
            return Err(Error::CharacteristicNotFound);
        }
        self.transport
            .write_characteristic(payload)
            .map_err(|err| map_io_error(&err, Error::SendFailed))
    }

    /// Tear the link down. Idempotent; always eventually yields a
    /// `Disconnected` event, and never panics.
    pub fn disconnect(&mut self) {
        match self.state {
            LinkState::Disconnected => self.emit(LinkEvent::Disconnected),
            LinkState::Disconnecting => {}
            _ => {
                self.state = LinkState::Disconnecting;
                if let Err(err) = self.transport.disconnect() {
                    // The platform could not even start the teardown; the
                    // confirmation event will never come, so settle now.
                    warn!(address = %self.address, error = %err, "GATT disconnect failed");
                    self.state = LinkState::Disconnected;
                    self.emit(LinkEvent::Disconnected);
                }
            }
        }
    }

    /// Advance the state machine with one transport event.
    ///
    /// Events must be delivered in platform arrival order; each
    /// notification becomes exactly one `Data` event.
    pub fn handle_transport_event(&mut self, event: GattEvent) {
        match event {
            GattEvent::Connected => {
                self.emit(LinkEvent::Connected);
                if let Err(err) = self
                    .transport
                    .discover_services(CONTROL_SERVICE_UUID, CONTROL_CHARACTERISTIC_UUID)
                {
                    self.emit(LinkEvent::Failed(map_io_error(&err, Error::ConnectionFailed)));
                }
            }
            GattEvent::ServicesDiscovered {
                service,
                characteristic,
            } => {
                if !service {
                    self.emit(LinkEvent::Failed(Error::ServiceNotFound));
                    return;
                }
                if !characteristic {
                    self.emit(LinkEvent::Failed(Error::CharacteristicNotFound));
                    return;
                }
                if let Err(err) = self.transport.enable_notifications() {
                    self.emit(LinkEvent::Failed(map_io_error(&err, Error::ConnectionFailed)));
                    return;
                }
                self.state = LinkState::Ready;
                self.emit(LinkEvent::Ready);
            }
            GattEvent::Notification(data) => self.emit(LinkEvent::Data(data)),
            GattEvent::ConnectionLosing => self.emit(LinkEvent::ConnectionLosing),
            GattEvent::Disconnected => {
                self.state = LinkState::Disconnected;
                self.emit(LinkEvent::Disconnected);
            }
        }
    }

    /// Drive the session from a transport event stream on one coordinating
    /// task, in arrival order. Returns once the link reports down or the
    /// platform closes the stream.
    pub async fn pump(&mut self, events: &mut mpsc::UnboundedReceiver<GattEvent>) {
        while let Some(event) = events.recv().await {
            let done = matches!(event, GattEvent::Disconnected);
            self.handle_transport_event(event);
            if done {
                break;
            }
        }
    }

    fn emit(&self, event: LinkEvent) {
        // A dropped receiver means the owning orchestrator is gone.
        let _ = self.events.send(event);
    }
}
