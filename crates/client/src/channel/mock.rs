// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory transport for tests.
//!
//! A [`MockNetwork`] plays the server: it accepts or refuses connections,
//! records every message clients send, and pushes frames to the most
//! recently connected client.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use busline_core::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;

use super::transport::{Transport, TransportError, TransportFactory, TransportFuture};

#[derive(Default)]
struct NetworkState {
    connect_attempts: u32,
    refuse: bool,
    fail_writes: bool,
    urls: Vec<String>,
    sent: Vec<ClientMessage>,
    peer: Option<mpsc::UnboundedSender<String>>,
}

/// Fake server shared by every transport built from [`MockNetwork::factory`].
#[derive(Clone, Default)]
pub struct MockNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory handing out transports bound to this network.
    pub fn factory(&self) -> TransportFactory {
        let state = Arc::clone(&self.state);
        Box::new(move || {
            Box::new(MockTransport {
                network: Arc::clone(&state),
                rx: None,
            })
        })
    }

    /// A single transport bound to this network.
    pub fn transport(&self) -> MockTransport {
        MockTransport {
            network: Arc::clone(&self.state),
            rx: None,
        }
    }

    /// Refuse (or accept again) all connection attempts.
    pub fn refuse_connections(&self, refuse: bool) {
        self.state.lock().unwrap().refuse = refuse;
    }

    /// Make every client write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn connect_attempts(&self) -> u32 {
        self.state.lock().unwrap().connect_attempts
    }

    pub fn urls(&self) -> Vec<String> {
        self.state.lock().unwrap().urls.clone()
    }

    /// Every message clients have sent, in order.
    pub fn sent(&self) -> Vec<ClientMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Sent messages excluding heartbeats.
    pub fn sent_without_heartbeats(&self) -> Vec<ClientMessage> {
        self.sent()
            .into_iter()
            .filter(|m| !matches!(m, ClientMessage::Heartbeat))
            .collect()
    }

    pub fn clear_sent(&self) {
        self.state.lock().unwrap().sent.clear();
    }

    /// Whether a client is currently connected.
    pub fn has_peer(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .peer
            .as_ref()
            .is_some_and(|p| !p.is_closed())
    }

    /// Sends a message to the connected client.
    pub fn push(&self, msg: &ServerMessage) -> bool {
        self.push_raw(&msg.to_json().unwrap())
    }

    /// Sends an arbitrary text frame to the connected client.
    pub fn push_raw(&self, text: &str) -> bool {
        match self.state.lock().unwrap().peer.as_ref() {
            Some(peer) => peer.send(text.to_string()).is_ok(),
            None => false,
        }
    }

    /// Drops the server side of the current connection.
    pub fn drop_connection(&self) {
        self.state.lock().unwrap().peer = None;
    }
}

/// Client half of a [`MockNetwork`] connection.
pub struct MockTransport {
    network: Arc<Mutex<NetworkState>>,
    rx: Option<mpsc::UnboundedReceiver<String>>,
}

impl Transport for MockTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            let mut network = self.network.lock().unwrap();
            network.connect_attempts += 1;
            network.urls.push(url);

            if network.refuse {
                return Err(TransportError::Connect("mock refused".into()));
            }

            let (tx, rx) = mpsc::unbounded_channel();
            network.peer = Some(tx);
            drop(network);
            self.rx = Some(rx);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.rx = None;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if self.rx.is_none() {
                return Err(TransportError::NotConnected);
            }
            let mut network = self.network.lock().unwrap();
            if network.fail_writes {
                return Err(TransportError::Write("mock write failure".into()));
            }
            network.sent.push(msg);
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<String>> {
        Box::pin(async move {
            let rx = self.rx.as_mut().ok_or(TransportError::NotConnected)?;
            match rx.recv().await {
                Some(text) => Ok(Some(text)),
                None => {
                    self.rx = None;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.rx.is_some()
    }
}
