//! Transport abstractions the link sessions are built against.
//!
//! These traits are the session-side view of the platform's radio stack:
//! command primitives the session invokes, and (for GATT) an event
//! vocabulary the platform feeds back. Platform implementations report
//! failures as `std::io::Error`; the sessions convert those to the stable
//! error enumeration at this boundary, so nothing platform-native
//! propagates further up.
//!
//! Traits use native `async fn` where an operation completes later
//! (Edition 2024 RPITIT); only `StreamReader::read_chunk` carries an
//! explicit `Send` bound, because it runs inside the session's dedicated
//! reader task.

#![allow(async_fn_in_trait)]

use keyway_core::{DeviceAddress, Error};
use std::future::Future;
use std::io;
use uuid::Uuid;

/// Convert a platform fault into a stable error code.
///
/// Permission and unknown-address faults keep their specific codes; every
/// other kind collapses to the failing operation's code.
pub(crate) fn map_io_error(err: &io::Error, fallback: Error) -> Error {
    match err.kind() {
        io::ErrorKind::PermissionDenied => Error::BluetoothPermissionDenied,
        io::ErrorKind::NotFound => Error::NoDevice,
        _ => fallback,
    }
}

/// Callback-side events of a GATT connection, in platform arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattEvent {
    /// The low-level link came up.
    Connected,
    /// Service discovery finished; flags say whether the expected control
    /// service and characteristic were resolved.
    ServicesDiscovered { service: bool, characteristic: bool },
    /// One notification arrived on the control characteristic.
    Notification(Vec<u8>),
    /// The radio is turning off or the link is about to drop.
    ConnectionLosing,
    /// The link is down.
    Disconnected,
}

/// Command side of a GATT connection.
///
/// Calls initiate platform operations; their outcomes arrive later as
/// [`GattEvent`]s. An immediate `Err` means the operation could not even
/// be started.
pub trait GattTransport {
    fn connect(&mut self, address: &DeviceAddress) -> io::Result<()>;
    fn discover_services(&mut self, service: Uuid, characteristic: Uuid) -> io::Result<()>;
    fn enable_notifications(&mut self) -> io::Result<()>;
    fn write_characteristic(&mut self, payload: &[u8]) -> io::Result<()>;
    fn disconnect(&mut self) -> io::Result<()>;
}

/// Bonding state of a Classic peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondState {
    Bonded,
    Bonding,
    NotBonded,
}

/// Stream-socket side of the Classic transport.
///
/// `open` hands out the connection's read and write halves; the session
/// gives the reader to its dedicated read task and keeps the writer.
/// `close_socket` releases the underlying socket after both halves are
/// closed.
pub trait StreamTransport {
    type Reader: StreamReader + Send + 'static;
    type Writer: StreamWriter;

    fn bond_state(&mut self, address: &DeviceAddress) -> BondState;
    fn request_bond(&mut self, address: &DeviceAddress) -> io::Result<()>;
    /// Resolve the next bond-state change for the peripheral a bond was
    /// requested of.
    async fn next_bond_change(&mut self) -> BondState;
    async fn open(&mut self, address: &DeviceAddress)
    -> io::Result<(Self::Reader, Self::Writer)>;
    fn close_socket(&mut self) -> io::Result<()>;
}

/// Read half of an open stream socket.
pub trait StreamReader {
    /// Blocking-read the next chunk into `buf`; `Ok(0)` means the peer
    /// closed the stream.
    fn read_chunk(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
    fn close(&mut self) -> io::Result<()>;
}

/// Write half of an open stream socket.
pub trait StreamWriter {
    fn write_all(&mut self, payload: &[u8]) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}
