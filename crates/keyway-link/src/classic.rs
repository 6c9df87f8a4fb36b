//! Classic-RFCOMM link session.
//!
//! Connecting checks the bond first: an unbonded peripheral triggers a
//! bonding request, and progress suspends until the bond resolves — bonded
//! proceeds to the socket, none is a terminal `ConnectionFailed`.
//!
//! Once open, exactly one dedicated reader task blocking-reads chunks and
//! republishes each as text. The protocol is undelimited at the transport
//! level, so chunk boundaries mean nothing; consumers match on substrings.
//! The task is bound to the session through a cancellation token checked
//! every read iteration and is joined before `disconnect` returns — it
//! cannot outlive the streams it reads from.

use crate::events::LinkEvent;
use crate::traits::{BondState, StreamReader, StreamTransport, StreamWriter, map_io_error};
use keyway_core::{DeviceAddress, Error, LinkState, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const READ_BUFFER_SIZE: usize = 1024;

pub struct ClassicLinkSession<T: StreamTransport> {
    transport: T,
    address: DeviceAddress,
    state: LinkState,
    events: mpsc::UnboundedSender<LinkEvent>,
    cancel: CancellationToken,
    reader_task: Option<JoinHandle<T::Reader>>,
    writer: Option<T::Writer>,
}

impl<T: StreamTransport> ClassicLinkSession<T> {
    /// Create a session for one peripheral; the receiver carries the
    /// session's upward events.
    pub fn new(transport: T, address: DeviceAddress) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = ClassicLinkSession {
            transport,
            address,
            state: LinkState::Disconnected,
            events,
            cancel: CancellationToken::new(),
            reader_task: None,
            writer: None,
        };
        (session, rx)
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Bond if necessary, open the stream socket, and start the reader.
    ///
    /// Emits `Connected` on success. A bond that resolves to none is
    /// terminal: `ConnectionFailed`, no retry.
    pub async fn connect(&mut self) -> Result<()> {
        if !self.state.can_connect() {
            return Err(Error::ConnectionFailed);
        }
        self.state = LinkState::Connecting;

        match self.transport.bond_state(&self.address) {
            BondState::Bonded => self.open_session().await,
            BondState::Bonding | BondState::NotBonded => {
                debug!(address = %self.address, "peripheral unbonded, requesting bond");
                if let Err(err) = self.transport.request_bond(&self.address) {
                    self.state = LinkState::Disconnected;
                    return Err(map_io_error(&err, Error::ConnectionFailed));
                }
                self.state = LinkState::AwaitingBond;
                loop {
                    match self.transport.next_bond_change().await {
                        BondState::Bonded => break self.open_session().await,
                        BondState::Bonding => continue,
                        BondState::NotBonded => {
                            self.state = LinkState::Disconnected;
                            break Err(Error::ConnectionFailed);
                        }
                    }
                }
            }
        }
    }

    async fn open_session(&mut self) -> Result<()> {
        let (reader, writer) = match self.transport.open(&self.address).await {
            Ok(halves) => halves,
            Err(err) => {
                self.state = LinkState::Disconnected;
                return Err(map_io_error(&err, Error::ConnectionFailed));
            }
        };
        self.writer = Some(writer);
        self.cancel = CancellationToken::new();
        self.reader_task = Some(spawn_reader(
            reader,
            self.events.clone(),
            self.cancel.child_token(),
        ));
        self.state = LinkState::Ready;
        debug!(address = %self.address, "stream session open");
        self.emit(LinkEvent::Connected);
        Ok(())
    }

    /// Write raw bytes, fire-and-forget.
    ///
    /// `NotConnected` when no stream is open; an I/O failure is
    /// `SendFailed` with no retry.
    pub fn send(&mut self, text: &str) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::NotConnected);
        };
        writer
            .write_all(text.as_bytes())
            .map_err(|err| map_io_error(&err, Error::SendFailed))
    }

    /// Forward the platform's link-about-to-drop advisory.
    ///
    /// Best effort only: it may race the hard disconnect confirmation, and
    /// callers may race a cleanup command against it.
    pub fn connection_losing(&self) {
        self.emit(LinkEvent::ConnectionLosing);
    }

    /// Tear the session down from any state, including never-connected.
    ///
    /// Stops and joins the reader task first, then closes output stream,
    /// input stream and socket in that order — each is released on every
    /// exit path — and only then signals `Disconnected` (or
    /// `DisconnectionFailed` if a close failed). Never panics; calling it
    /// again settles on `Disconnected`.
    pub async fn disconnect(&mut self) {
        if self.state == LinkState::Disconnected
            && self.reader_task.is_none()
            && self.writer.is_none()
        {
            self.emit(LinkEvent::Disconnected);
            return;
        }
        self.state = LinkState::Disconnecting;
        self.cancel.cancel();

        // The reader must be gone before its stream is closed underneath it.
        let mut reader = None;
        if let Some(task) = self.reader_task.take() {
            match task.await {
                Ok(r) => reader = Some(r),
                Err(err) => warn!(address = %self.address, error = %err, "reader task panicked"),
            }
        }

        let mut close_error: Option<std::io::Error> = None;
        if let Some(mut writer) = self.writer.take()
            && let Err(err) = writer.close()
        {
            close_error.get_or_insert(err);
        }
        if let Some(mut reader) = reader
            && let Err(err) = reader.close()
        {
            close_error.get_or_insert(err);
        }
        if let Err(err) = self.transport.close_socket() {
            close_error.get_or_insert(err);
        }

        self.state = LinkState::Disconnected;
        match close_error {
            None => self.emit(LinkEvent::Disconnected),
            Some(err) => {
                warn!(address = %self.address, error = %err, "close failed during teardown");
                self.emit(LinkEvent::Failed(Error::DisconnectionFailed));
            }
        }
    }

    fn emit(&self, event: LinkEvent) {
        let _ = self.events.send(event);
    }
}

/// The session's one dedicated reader task.
///
/// Returns the reader on exit so teardown can close it in order. The
/// cancellation check runs every iteration; a pending read is abandoned
/// the moment the token fires.
fn spawn_reader<R: StreamReader + Send + 'static>(
    mut reader: R,
    events: mpsc::UnboundedSender<LinkEvent>,
    cancel: CancellationToken,
) -> JoinHandle<R> {
    tokio::spawn(async move {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                read = reader.read_chunk(&mut buf) => match read {
                    Ok(0) => {
                        debug!("peer closed the stream");
                        break;
                    }
                    Ok(n) => {
                        let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                        if events.send(LinkEvent::Text(chunk)).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "stream read failed");
                        let _ = events.send(LinkEvent::Failed(Error::ReadFailed));
                        break;
                    }
                },
            }
        }
        reader
    })
}
