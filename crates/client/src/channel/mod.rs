// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport channel: one connection and its I/O task.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ClientMessage   ┌─────────────┐     ┌─────────────┐
//! │ChannelSender │─────────────────►│  I/O task   │────►│  Transport  │
//! └──────────────┘                  │ (heartbeat) │◄────│   (trait)   │
//!                                   └─────────────┘     └─────────────┘
//!                                          │
//!                                          ▼ (ChannelId, ChannelEvent)
//!                                   ┌─────────────┐
//!                                   │ Coordinator │
//!                                   └─────────────┘
//! ```
//!
//! A channel is mechanical: it connects, forwards outbound messages, passes
//! inbound frames up, and sends a heartbeat while open. It never retries;
//! reconnection policy belongs to the coordinator.

mod transport;

pub use transport::{
    Transport, TransportError, TransportFactory, TransportFuture, TransportResult,
    WebSocketTransport,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use busline_core::ClientMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Identifies one channel among the coordinator's successive connections.
pub type ChannelId = u64;

/// Sink for channel lifecycle events.
pub type EventSink = mpsc::UnboundedSender<(ChannelId, ChannelEvent)>;

/// An inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Frame parsed as JSON; shape not yet interpreted.
    Json(serde_json::Value),
    /// Frame that is not valid JSON, passed through verbatim.
    Raw(String),
}

impl Inbound {
    fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Inbound::Json(value),
            Err(_) => Inbound::Raw(text),
        }
    }
}

/// The four lifecycle events a channel reports.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Connection established; sends are accepted from now on.
    Open,
    /// A frame arrived.
    Message(Inbound),
    /// Connect, send or receive failed. Always followed by `Closed`.
    Error(String),
    /// The channel is finished. `clean` is true only for a local [`TransportChannel::close`].
    Closed { clean: bool },
}

/// Cloneable handle for queueing outbound messages.
#[derive(Clone)]
pub struct ChannelSender {
    open: Arc<AtomicBool>,
    outbound: mpsc::UnboundedSender<ClientMessage>,
}

impl ChannelSender {
    /// Queues a message. Logs and returns false if the channel is not open.
    pub fn send(&self, msg: ClientMessage) -> bool {
        if !self.is_open() {
            error!(message = message_kind(&msg), "cannot send: channel not open");
            return false;
        }
        if self.outbound.send(msg).is_err() {
            error!("cannot send: channel task has stopped");
            return false;
        }
        true
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

/// One connection attempt and, if it succeeds, the live connection.
pub struct TransportChannel {
    id: ChannelId,
    sender: ChannelSender,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TransportChannel {
    /// Starts connecting to `url` in the background.
    ///
    /// Progress is reported on `events`, tagged with `id`.
    pub fn connect(
        id: ChannelId,
        url: &str,
        transport: Box<dyn Transport>,
        heartbeat_interval: Duration,
        events: EventSink,
    ) -> Self {
        let open = Arc::new(AtomicBool::new(false));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let io = ChannelIo {
            id,
            url: url.to_string(),
            transport,
            heartbeat_interval,
            open: Arc::clone(&open),
            outbound: outbound_rx,
            events,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(io.run());

        TransportChannel {
            id,
            sender: ChannelSender {
                open,
                outbound: outbound_tx,
            },
            cancel,
            task: Some(task),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.sender.is_open()
    }

    /// Queues a message. Logs and returns false if the channel is not open.
    pub fn send(&self, msg: ClientMessage) -> bool {
        self.sender.send(msg)
    }

    pub fn sender(&self) -> ChannelSender {
        self.sender.clone()
    }

    /// Closes the connection and waits for the I/O task (and its heartbeat) to end.
    pub async fn close(&mut self) {
        self.sender.open.store(false, Ordering::Release);
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(channel = self.id, error = %e, "channel task ended abnormally");
            }
        }
    }
}

impl Drop for TransportChannel {
    fn drop(&mut self) {
        self.sender.open.store(false, Ordering::Release);
        self.cancel.cancel();
    }
}

/// State owned by the I/O task.
struct ChannelIo {
    id: ChannelId,
    url: String,
    transport: Box<dyn Transport>,
    heartbeat_interval: Duration,
    open: Arc<AtomicBool>,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    events: EventSink,
    cancel: CancellationToken,
}

impl ChannelIo {
    async fn run(mut self) {
        let connected = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.emit(ChannelEvent::Closed { clean: true });
                return;
            }
            result = self.transport.connect(&self.url) => result,
        };

        if let Err(e) = connected {
            warn!(channel = self.id, url = %self.url, error = %e, "connection attempt failed");
            self.emit(ChannelEvent::Error(e.to_string()));
            self.emit(ChannelEvent::Closed { clean: false });
            return;
        }

        info!(channel = self.id, url = %self.url, "channel open");
        self.open.store(true, Ordering::Release);
        self.emit(ChannelEvent::Open);

        let period = self.heartbeat_interval.max(Duration::from_millis(1));
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let clean = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break true,

                msg = self.outbound.recv() => {
                    let Some(msg) = msg else { break true };
                    if let Err(e) = self.transport.send(msg).await {
                        self.emit(ChannelEvent::Error(e.to_string()));
                        break false;
                    }
                }

                frame = self.transport.recv() => match frame {
                    Ok(Some(text)) => {
                        self.emit(ChannelEvent::Message(Inbound::parse(text)));
                    }
                    Ok(None) => {
                        info!(channel = self.id, "connection closed by server");
                        break false;
                    }
                    Err(e) => {
                        self.emit(ChannelEvent::Error(e.to_string()));
                        break false;
                    }
                },

                _ = heartbeat.tick() => {
                    debug!(channel = self.id, "heartbeat");
                    if let Err(e) = self.transport.send(ClientMessage::heartbeat()).await {
                        self.emit(ChannelEvent::Error(e.to_string()));
                        break false;
                    }
                }
            }
        };

        self.open.store(false, Ordering::Release);
        let _ = self.transport.disconnect().await;
        self.emit(ChannelEvent::Closed { clean });
    }

    fn emit(&self, event: ChannelEvent) {
        // The coordinator may already have moved on to another channel
        let _ = self.events.send((self.id, event));
    }
}

/// Wire name of a message, for logging.
fn message_kind(msg: &ClientMessage) -> &'static str {
    match msg {
        ClientMessage::Subscribe { .. } => "subscribe",
        ClientMessage::LocationReport { .. } => "location_report",
        ClientMessage::BoardingAction { .. } => "boarding_action",
        ClientMessage::Heartbeat => "heartbeat",
        ClientMessage::StatusQuery { .. } => "status_query",
    }
}

#[cfg(test)]
pub(crate) mod mock;

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
