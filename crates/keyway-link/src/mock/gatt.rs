//! Scripted GATT transport.

use crate::traits::{GattEvent, GattTransport};
use keyway_core::DeviceAddress;
use std::io;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    service_present: bool,
    characteristic_present: bool,
    connect_error: Option<io::ErrorKind>,
    write_error: Option<io::ErrorKind>,
    calls: Vec<String>,
    written: Vec<Vec<u8>>,
}

/// Fake [`GattTransport`] recording every command it receives.
///
/// The transport only records; the test decides when the corresponding
/// [`GattEvent`]s reach the session, which is exactly how the platform
/// behaves.
#[derive(Debug)]
pub struct MockGatt {
    state: Arc<Mutex<State>>,
}

impl MockGatt {
    /// A transport whose peripheral exposes the expected service and
    /// characteristic.
    pub fn working() -> (Self, MockGattHandle) {
        let state = Arc::new(Mutex::new(State {
            service_present: true,
            characteristic_present: true,
            ..State::default()
        }));
        (
            MockGatt {
                state: Arc::clone(&state),
            },
            MockGattHandle { state },
        )
    }
}

impl GattTransport for MockGatt {
    fn connect(&mut self, address: &DeviceAddress) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("connect {address}"));
        match state.connect_error {
            Some(kind) => Err(io::Error::from(kind)),
            None => Ok(()),
        }
    }

    fn discover_services(&mut self, service: Uuid, characteristic: Uuid) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("discover {service} {characteristic}"));
        Ok(())
    }

    fn enable_notifications(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().calls.push("subscribe".into());
        Ok(())
    }

    fn write_characteristic(&mut self, payload: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.write_error {
            return Err(io::Error::from(kind));
        }
        state.written.push(payload.to_vec());
        Ok(())
    }

    fn disconnect(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().calls.push("disconnect".into());
        Ok(())
    }
}

/// Test-side handle for a [`MockGatt`].
#[derive(Debug, Clone)]
pub struct MockGattHandle {
    state: Arc<Mutex<State>>,
}

impl MockGattHandle {
    pub fn set_service_present(&self, present: bool) {
        self.state.lock().unwrap().service_present = present;
    }

    pub fn set_characteristic_present(&self, present: bool) {
        self.state.lock().unwrap().characteristic_present = present;
    }

    pub fn fail_connect(&self, kind: io::ErrorKind) {
        self.state.lock().unwrap().connect_error = Some(kind);
    }

    pub fn fail_write(&self, kind: io::ErrorKind) {
        self.state.lock().unwrap().write_error = Some(kind);
    }

    /// The discovery-outcome event matching the scripted peripheral.
    pub fn discovery_event(&self) -> GattEvent {
        let state = self.state.lock().unwrap();
        GattEvent::ServicesDiscovered {
            service: state.service_present,
            characteristic: state.characteristic_present,
        }
    }

    /// Every command the session issued, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Every frame written to the control characteristic.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().written.clone()
    }
}
