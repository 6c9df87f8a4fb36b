//! Fake transports for driving sessions without radio hardware.
//!
//! Each mock comes as a `(transport, handle)` pair: the transport moves
//! into the session, the handle stays with the test to script outcomes
//! and inspect what the session did.

mod gatt;
mod stream;

pub use gatt::{MockGatt, MockGattHandle};
pub use stream::{MockStream, MockStreamHandle};
