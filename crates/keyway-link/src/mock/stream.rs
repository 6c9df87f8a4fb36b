//! Scripted Classic stream transport.

use crate::traits::{BondState, StreamReader, StreamTransport, StreamWriter};
use keyway_core::DeviceAddress;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct State {
    open_error: Option<io::ErrorKind>,
    write_error: Option<io::ErrorKind>,
    output_close_error: bool,
    written: Vec<Vec<u8>>,
    closes: Vec<&'static str>,
    bond_requests: usize,
}

/// Fake [`StreamTransport`] with scripted bond changes and read chunks.
#[derive(Debug)]
pub struct MockStream {
    state: Arc<Mutex<State>>,
    bond: BondState,
    bond_changes: mpsc::UnboundedReceiver<BondState>,
    chunks: Option<mpsc::UnboundedReceiver<io::Result<Vec<u8>>>>,
}

impl MockStream {
    pub fn with_bond(bond: BondState) -> (Self, MockStreamHandle) {
        let state = Arc::new(Mutex::new(State::default()));
        let (bond_tx, bond_rx) = mpsc::unbounded_channel();
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let transport = MockStream {
            state: Arc::clone(&state),
            bond,
            bond_changes: bond_rx,
            chunks: Some(chunk_rx),
        };
        let handle = MockStreamHandle {
            state,
            bond_tx,
            chunk_tx,
        };
        (transport, handle)
    }

    /// A transport whose peripheral is already bonded.
    pub fn bonded() -> (Self, MockStreamHandle) {
        Self::with_bond(BondState::Bonded)
    }
}

impl StreamTransport for MockStream {
    type Reader = MockStreamReader;
    type Writer = MockStreamWriter;

    fn bond_state(&mut self, _address: &DeviceAddress) -> BondState {
        self.bond
    }

    fn request_bond(&mut self, _address: &DeviceAddress) -> io::Result<()> {
        self.state.lock().unwrap().bond_requests += 1;
        Ok(())
    }

    async fn next_bond_change(&mut self) -> BondState {
        match self.bond_changes.recv().await {
            Some(state) => {
                self.bond = state;
                state
            }
            // Script exhausted: behave like a platform that never answers.
            None => std::future::pending().await,
        }
    }

    async fn open(
        &mut self,
        _address: &DeviceAddress,
    ) -> io::Result<(Self::Reader, Self::Writer)> {
        if let Some(kind) = self.state.lock().unwrap().open_error {
            return Err(io::Error::from(kind));
        }
        let Some(chunks) = self.chunks.take() else {
            return Err(io::Error::other("mock stream already opened"));
        };
        Ok((
            MockStreamReader {
                chunks,
                state: Arc::clone(&self.state),
            },
            MockStreamWriter {
                state: Arc::clone(&self.state),
            },
        ))
    }

    fn close_socket(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().closes.push("socket");
        Ok(())
    }
}

/// Read half handed to the session's reader task.
#[derive(Debug)]
pub struct MockStreamReader {
    chunks: mpsc::UnboundedReceiver<io::Result<Vec<u8>>>,
    state: Arc<Mutex<State>>,
}

impl StreamReader for MockStreamReader {
    fn read_chunk(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send {
        async move {
            match self.chunks.recv().await {
                Some(Ok(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                }
                Some(Err(err)) => Err(err),
                None => Ok(0),
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().closes.push("input");
        Ok(())
    }
}

/// Write half kept by the session.
#[derive(Debug)]
pub struct MockStreamWriter {
    state: Arc<Mutex<State>>,
}

impl StreamWriter for MockStreamWriter {
    fn write_all(&mut self, payload: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.write_error {
            return Err(io::Error::from(kind));
        }
        state.written.push(payload.to_vec());
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closes.push("output");
        if state.output_close_error {
            return Err(io::Error::other("output stream close failed"));
        }
        Ok(())
    }
}

/// Test-side handle for a [`MockStream`].
#[derive(Debug, Clone)]
pub struct MockStreamHandle {
    state: Arc<Mutex<State>>,
    bond_tx: mpsc::UnboundedSender<BondState>,
    chunk_tx: mpsc::UnboundedSender<io::Result<Vec<u8>>>,
}

impl MockStreamHandle {
    /// Queue a bond-state change for `next_bond_change` to resolve.
    pub fn push_bond_change(&self, state: BondState) {
        let _ = self.bond_tx.send(state);
    }

    /// Queue one read chunk.
    pub fn push_chunk(&self, text: &str) {
        let _ = self.chunk_tx.send(Ok(text.as_bytes().to_vec()));
    }

    /// Queue a read failure.
    pub fn push_read_error(&self, kind: io::ErrorKind) {
        let _ = self.chunk_tx.send(Err(io::Error::from(kind)));
    }

    pub fn fail_open(&self, kind: io::ErrorKind) {
        self.state.lock().unwrap().open_error = Some(kind);
    }

    pub fn fail_write(&self, kind: io::ErrorKind) {
        self.state.lock().unwrap().write_error = Some(kind);
    }

    pub fn fail_output_close(&self) {
        self.state.lock().unwrap().output_close_error = true;
    }

    /// Everything the session wrote, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().written.clone()
    }

    /// Close calls observed so far, in order: `"output"`, `"input"`,
    /// `"socket"`.
    pub fn closes(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().closes.clone()
    }

    pub fn bond_requests(&self) -> usize {
        self.state.lock().unwrap().bond_requests
    }
}
