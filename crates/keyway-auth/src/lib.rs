//! Authorization and provisioning primitives.
//!
//! Everything here is pure computation over injected inputs:
//!
//! - [`totp`] — the time-based one-time-password gate that authorizes
//!   state-changing commands. Validation is entirely local against a
//!   secret provisioned out of band; there is no server corroboration
//!   step. That is a deliberate trust trade-off: a compromised client
//!   secret fully compromises the gate, and nothing in this crate tries
//!   to paper over it.
//! - [`provisioning`] — decryption of out-of-band registration tokens and
//!   the Base32 codec used for secret material.
//! - [`clock`] — the injected wall-clock seam and the server/device
//!   clock-offset check.

pub mod clock;
pub mod provisioning;
pub mod totp;

pub use clock::{Clock, SystemClock, within_sync_margin};
pub use provisioning::{decode_base32, decrypt_token, encode_base32};
pub use totp::{AuthorizationGate, TotpSecret};
