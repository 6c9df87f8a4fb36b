//! Link sessions for the two radio transports.
//!
//! A link session owns one peripheral connection's lifecycle and raw
//! byte/text exchange — nothing more. Codecs live in `keyway-protocol`;
//! retry policy, queueing and reconnection are deliberately absent and
//! belong to whoever embeds the session.
//!
//! Both variants are driven through injected transport abstractions
//! ([`traits`]) instead of platform objects, so a fake transport can walk
//! them through every state in tests ([`mock`]). Upward they speak one
//! event vocabulary ([`LinkEvent`]) and one capability surface — connect,
//! disconnect, send, plus the event receiver — regardless of peripheral
//! family.
//!
//! Concurrency model:
//! - [`LeLinkSession`] is single-threaded and event-driven; transport
//!   callbacks are marshaled through one [`pump`](LeLinkSession::pump)
//!   loop in arrival order, and handlers never block.
//! - [`ClassicLinkSession`] runs exactly one dedicated reader task per
//!   active session, cancelled cooperatively on disconnect and joined
//!   before `disconnect` returns.
//!
//! Sends are fire-and-forget on both variants: no send queue, no
//! backpressure, no implicit serialization. Overlapping sends are the
//! caller's concern.

pub mod classic;
pub mod events;
pub mod le;
pub mod mock;
pub mod traits;

pub use classic::ClassicLinkSession;
pub use events::LinkEvent;
pub use le::LeLinkSession;
pub use traits::{BondState, GattEvent, GattTransport, StreamReader, StreamTransport, StreamWriter};
