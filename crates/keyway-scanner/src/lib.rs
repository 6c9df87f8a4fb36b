//! Peripheral discovery over both radio transports.
//!
//! The scanner verifies every radio precondition synchronously before it
//! touches the platform — capability, permissions, power-save mode,
//! location services — and the first failure is returned as a typed error
//! with no scan started and no events emitted. Once a scan window opens,
//! results and failures flow through the event channel, and the window
//! ends in exactly one `FinishSearch` however it ends.

pub mod platform;
pub mod scanner;

pub use platform::{Advertisement, DiscoveredDevice, RadioPlatform};
pub use scanner::{ScanEvent, TransportScanner};

pub mod mock;
