//! WebSocket transport.
//!
//! Text frames carry JSON messages. Binary frames are accepted when they hold
//! UTF-8; ping/pong is handled by the protocol layer.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::errors::TransportError;
use crate::transport::{ClientEndpoint, Endpoint, FrameTransport, SolverEndpoint};

/// A WebSocket connection as a [`FrameTransport`].
#[derive(Debug)]
pub struct WebSocketTransport<S> {
    stream: WebSocketStream<S>,
}

impl<S> WebSocketTransport<S> {
    /// Wrap an established WebSocket stream.
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }
}

fn is_closed(err: &tungstenite::Error) -> bool {
    matches!(
        err,
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
    )
}

#[async_trait]
impl<S> FrameTransport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_frame(&mut self, frame: String) -> Result<(), TransportError> {
        match self.stream.send(Message::text(frame)).await {
            Ok(()) => Ok(()),
            Err(e) if is_closed(&e) => Err(TransportError::Closed),
            Err(e) => Err(e.into()),
        }
    }

    async fn recv_frame(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let msg = match self.stream.next().await {
                None => return Ok(None),
                Some(Err(e)) if is_closed(&e) => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(msg)) => msg,
            };
            match msg {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes.to_vec())
                        .map(Some)
                        .map_err(|_| TransportError::NotUtf8);
                }
                Message::Close(frame) => {
                    debug!(?frame, "peer sent close");
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Err(e) if !is_closed(&e) => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Accept one client on `listener` and complete the WebSocket handshake.
pub async fn accept(listener: &TcpListener) -> Result<SolverEndpoint, TransportError> {
    let (socket, peer) = listener.accept().await?;
    let stream = tokio_tungstenite::accept_async(socket).await?;
    info!(%peer, "proofreading client connected");
    Ok(Endpoint::new(Box::new(WebSocketTransport::new(stream))))
}

/// Connect to a solver at `url` (for example `ws://127.0.0.1:9001`).
pub async fn connect(url: &str) -> Result<ClientEndpoint, TransportError> {
    let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
    debug!(url, "connected to solver");
    let transport: WebSocketTransport<MaybeTlsStream<TcpStream>> = WebSocketTransport::new(stream);
    Ok(Endpoint::new(Box::new(transport)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ClientMessage, SolverMessage};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn round_trip_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let mut solver = accept(&listener).await.unwrap();
            let msg = solver.recv().await.unwrap();
            assert_eq!(msg, ClientMessage::Merge { segments: vec![1, 2] });
            solver
                .send(&SolverMessage::FragmentSegmentLut {
                    fragments: vec![1, 2],
                    segments: vec![5, 5],
                })
                .await
                .unwrap();
            solver.recv().await
        });

        let mut client = connect(&url).await.unwrap();
        client
            .send(&ClientMessage::Merge { segments: vec![1, 2] })
            .await
            .unwrap();
        assert_matches!(
            client.recv().await,
            Ok(SolverMessage::FragmentSegmentLut { segments, .. }) if segments == vec![5, 5]
        );
        client.close().await.unwrap();

        assert_matches!(server.await.unwrap(), Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn connect_to_nothing_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);
        assert!(connect(&url).await.is_err());
    }
}
