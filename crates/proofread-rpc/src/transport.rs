//! Typed endpoints over a frame transport.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::TransportError;
use crate::messages::{ClientMessage, SolverMessage};

/// A bidirectional channel of text frames.
#[async_trait]
pub trait FrameTransport: Send {
    /// Send one frame.
    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError>;

    /// Next frame, or `None` once the peer has closed.
    async fn recv_frame(&mut self) -> Result<Option<String>, TransportError>;

    /// Close the channel. Later sends fail with [`TransportError::Closed`].
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Owned duplex endpoint that receives `In` and sends `Out`.
///
/// Each endpoint is held by exactly one task; dropping it closes the
/// underlying transport.
pub struct Endpoint<In, Out> {
    transport: Box<dyn FrameTransport>,
    _marker: PhantomData<fn(Out) -> In>,
}

/// The solver's side: receives client messages.
pub type SolverEndpoint = Endpoint<ClientMessage, SolverMessage>;

/// The client's side: receives solver messages.
pub type ClientEndpoint = Endpoint<SolverMessage, ClientMessage>;

impl<In, Out> std::fmt::Debug for Endpoint<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint").finish_non_exhaustive()
    }
}

impl<In, Out> Endpoint<In, Out>
where
    In: DeserializeOwned,
    Out: Serialize + Sync,
{
    /// Type a raw frame transport.
    pub fn new(transport: Box<dyn FrameTransport>) -> Self {
        Self {
            transport,
            _marker: PhantomData,
        }
    }

    /// Encode and send one message.
    pub async fn send(&mut self, message: &Out) -> Result<(), TransportError> {
        let frame = serde_json::to_string(message).map_err(TransportError::Encode)?;
        self.transport.send_frame(frame).await
    }

    /// Receive and decode one message, blocking until one arrives.
    ///
    /// A closed peer yields [`TransportError::Closed`]; a frame that is not a
    /// known message yields [`TransportError::Decode`].
    pub async fn recv(&mut self) -> Result<In, TransportError> {
        let frame = self
            .transport
            .recv_frame()
            .await?
            .ok_or(TransportError::Closed)?;
        match serde_json::from_str(&frame) {
            Ok(message) => Ok(message),
            Err(source) => Err(TransportError::Decode { frame, source }),
        }
    }

    /// Send a raw frame without encoding. Useful for probing peers with
    /// malformed input.
    pub async fn send_raw(&mut self, frame: impl Into<String> + Send) -> Result<(), TransportError> {
        self.transport.send_frame(frame.into()).await
    }

    pub async fn close(mut self) -> Result<(), TransportError> {
        self.transport.close().await
    }
}
