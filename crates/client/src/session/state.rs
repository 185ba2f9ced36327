// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state shared between the session task and its readers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Where the coordinator is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection and none pending.
    #[default]
    Disconnected,
    /// First connection attempt of a session (or an explicit `ensure_active`).
    Connecting,
    /// Channel open.
    Connected,
    /// Retry number `attempt` is scheduled or in flight.
    Reconnecting { attempt: u32 },
    /// Teardown in progress.
    Closing,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting { attempt } => {
                write!(f, "reconnecting (attempt {})", attempt)
            }
            ConnectionState::Closing => write!(f, "closing"),
        }
    }
}

/// Connection status visible to both the session task and public readers.
///
/// The boolean open flag is lock-free for the hot `connection_status` path.
/// Only the session task writes.
#[derive(Debug, Default)]
pub(crate) struct SharedStatus {
    open: AtomicBool,
    state: Mutex<ConnectionState>,
}

impl SharedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Records the open flag. Returns true if it changed.
    pub fn set_open(&self, open: bool) -> bool {
        self.open.swap(open, Ordering::AcqRel) != open
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }
}
