// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge from host application lifecycle to the session coordinator.
//!
//! The host reports foreground/background transitions; the bridge forwards
//! each distinct transition to [`SessionCoordinator::set_app_state`]. Policy:
//! - foreground: ensure the channel is active, resync now, restart the resync timer
//! - background: stop the resync timer; the channel stays up

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::coordinator::SessionCoordinator;

/// Whether the host application is visible to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Foreground,
    Background,
}

/// Forwards every change on `states` to the coordinator until the sender is dropped.
///
/// The value current at spawn time is treated as already applied.
pub fn spawn_bridge(
    coordinator: SessionCoordinator,
    mut states: watch::Receiver<AppState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            debug!(?state, "app state changed");
            coordinator.set_app_state(state);
        }
        debug!("lifecycle bridge stopped");
    })
}

/// Owned lifecycle bridge: report transitions with [`LifecycleBridge::report`].
pub struct LifecycleBridge {
    states: watch::Sender<AppState>,
    task: JoinHandle<()>,
}

impl LifecycleBridge {
    /// Starts a bridge assuming the application is in the foreground.
    pub fn spawn(coordinator: SessionCoordinator) -> Self {
        let (states, rx) = watch::channel(AppState::Foreground);
        let task = spawn_bridge(coordinator, rx);
        LifecycleBridge { states, task }
    }

    /// Reports the current application state. Repeats of the same state are ignored.
    pub fn report(&self, state: AppState) {
        self.states.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    /// Last reported state.
    pub fn state(&self) -> AppState {
        *self.states.borrow()
    }
}

impl Drop for LifecycleBridge {
    fn drop(&mut self) {
        self.task.abort();
    }
}
