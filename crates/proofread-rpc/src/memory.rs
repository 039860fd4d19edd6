//! In-process transport over bounded channels.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::TransportError;
use crate::transport::{ClientEndpoint, Endpoint, FrameTransport, SolverEndpoint};

/// Frames buffered per direction before a sender waits.
pub const DEFAULT_CAPACITY: usize = 64;

/// One side of an in-process channel pair.
#[derive(Debug)]
pub struct MemoryTransport {
    tx: Option<mpsc::Sender<String>>,
    rx: mpsc::Receiver<String>,
}

/// Two connected transports.
pub fn pair(capacity: usize) -> (MemoryTransport, MemoryTransport) {
    let (a_tx, b_rx) = mpsc::channel(capacity.max(1));
    let (b_tx, a_rx) = mpsc::channel(capacity.max(1));
    (
        MemoryTransport {
            tx: Some(a_tx),
            rx: a_rx,
        },
        MemoryTransport {
            tx: Some(b_tx),
            rx: b_rx,
        },
    )
}

/// A connected solver/client endpoint pair.
pub fn endpoints() -> (SolverEndpoint, ClientEndpoint) {
    let (solver, client) = pair(DEFAULT_CAPACITY);
    (Endpoint::new(Box::new(solver)), Endpoint::new(Box::new(client)))
}

#[async_trait]
impl FrameTransport for MemoryTransport {
    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame).await.map_err(|_| TransportError::Closed)
    }

    async fn recv_frame(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}
