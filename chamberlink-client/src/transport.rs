//! Transport abstraction over the controller's WebSocket endpoint.
//!
//! The connection machinery only needs a bidirectional stream of binary
//! frames, so it talks to these traits; the production implementation rides
//! on `tokio-tungstenite`.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("transport closed")]
    Closed,
}

/// One live bidirectional frame stream to the controller.
#[async_trait]
pub trait Transport: Send {
    /// Receives the next binary frame. `None` means the peer closed the
    /// stream cleanly.
    async fn next_frame(&mut self) -> Option<Result<Bytes, TransportError>>;

    /// Sends one binary frame.
    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError>;

    /// Closes the stream. Errors on an already-closing stream are ignored.
    async fn close(&mut self);
}

/// Opens transports; the connection supervisor re-dials through this after
/// every teardown.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    type Conn: Transport + 'static;

    async fn dial(&self, url: &str) -> Result<Self::Conn, TransportError>;
}

/// WebSocket transport over `tokio-tungstenite`.
pub struct WsTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn next_frame(&mut self) -> Option<Result<Bytes, TransportError>> {
        while let Some(message) = self.inner.next().await {
            match message {
                Ok(Message::Binary(data)) => return Some(Ok(Bytes::from(data))),
                // The controller only ever sends binary; control frames are
                // handled by the library and anything else is noise.
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => continue,
                Ok(Message::Text(text)) => {
                    tracing::debug!(len = text.len(), "ignoring unexpected text message");
                    continue;
                }
                Ok(Message::Close(_)) => return None,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError> {
        self.inner.send(Message::Binary(frame.to_vec())).await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            tracing::debug!("error closing websocket: {}", e);
        }
    }
}

/// Dials `ws://` / `wss://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    type Conn = WsTransport;

    async fn dial(&self, url: &str) -> Result<WsTransport, TransportError> {
        let (stream, response) = connect_async(url).await?;
        tracing::debug!(status = %response.status(), "websocket handshake complete");
        Ok(WsTransport { inner: stream })
    }
}
