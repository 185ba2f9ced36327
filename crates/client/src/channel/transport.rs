// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The transport seam under a [`TransportChannel`](super::TransportChannel).
//!
//! A transport moves text frames and nothing else. It does not parse what it
//! receives, so a frame the client cannot interpret still reaches the
//! channel, and it never reconnects on its own.
//!
//! [`WebSocketTransport`] is the production implementation; tests plug in an
//! in-memory transport through the same trait.

use std::future::Future;
use std::pin::Pin;

use busline_core::ClientMessage;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Failures a transport can report.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("not connected")]
    NotConnected,

    #[error("write failed: {0}")]
    Write(String),

    #[error("read failed: {0}")]
    Read(String),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by every [`Transport`] method.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// One connection's worth of frame I/O.
///
/// Object-safe so a channel can own a `Box<dyn Transport>` built by a
/// [`TransportFactory`].
pub trait Transport: Send + Sync {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()>;

    /// Closes the connection if there is one. Never fails on an idle transport.
    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    /// Encodes and writes one message.
    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Next text frame, or `None` once the peer has closed the connection.
    fn recv(&mut self) -> TransportFuture<'_, Option<String>>;

    fn is_connected(&self) -> bool;
}

/// Builds a fresh transport for each connection attempt.
pub type TransportFactory = Box<dyn Fn() -> Box<dyn Transport> + Send + Sync>;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WsConnection {
    writer: SplitSink<WsStream, Message>,
    reader: SplitStream<WsStream>,
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Default)]
pub struct WebSocketTransport {
    conn: Option<WsConnection>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory producing a new WebSocket transport per connection attempt.
    pub fn factory() -> TransportFactory {
        Box::new(|| Box::new(WebSocketTransport::new()))
    }

    async fn write(&mut self, frame: Message) -> TransportResult<()> {
        let conn = self.conn.as_mut().ok_or(TransportError::NotConnected)?;

        // Flushing surfaces a dead connection on this write rather than the next
        let result = match conn.writer.send(frame).await {
            Ok(()) => conn.writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.conn = None;
            return Err(TransportError::Write(e.to_string()));
        }
        Ok(())
    }

    async fn read(&mut self) -> TransportResult<Option<String>> {
        let conn = self.conn.as_mut().ok_or(TransportError::NotConnected)?;

        let frame = loop {
            match conn.reader.next().await {
                Some(Ok(Message::Text(text))) => break Some(text.as_str().to_owned()),
                // Some servers send JSON as binary frames
                Some(Ok(Message::Binary(data))) => {
                    break Some(String::from_utf8_lossy(&data).into_owned())
                }
                Some(Ok(Message::Close(_))) | None => break None,
                // tungstenite answers pings itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.conn = None;
                    return Err(TransportError::Read(e.to_string()));
                }
            }
        };

        if frame.is_none() {
            self.conn = None;
        }
        Ok(frame)
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            let (writer, reader) = ws.split();
            self.conn = Some(WsConnection { writer, reader });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut conn) = self.conn.take() {
                let _ = conn.writer.close().await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let json = msg.to_json()?;
            self.write(Message::Text(json.into())).await
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<String>> {
        Box::pin(self.read())
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }
}
