// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection status listeners.
//!
//! Listeners are plain callbacks invoked with the new open/closed status on
//! every transition. Fan-out iterates over a snapshot of the registry taken
//! before the first call, so listeners may subscribe or unsubscribe from
//! inside a callback. A listener removed mid-pass is skipped if it has not
//! been reached yet.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Callback = dyn Fn(bool) + Send + Sync;

struct Entry {
    id: u64,
    active: AtomicBool,
    callback: Box<Callback>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Arc<Entry>>,
}

/// Registry of status listeners.
#[derive(Clone, Default)]
pub struct StatusListeners {
    registry: Arc<Mutex<Registry>>,
}

/// Handle returned by [`StatusListeners::subscribe`].
///
/// Dropping the handle does not unsubscribe; call [`unsubscribe`](Self::unsubscribe).
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl StatusListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Arc::new(Entry {
            id,
            active: AtomicBool::new(true),
            callback: Box::new(listener),
        }));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invokes every registered listener once with `status`.
    pub fn notify(&self, status: bool) {
        let snapshot: Vec<Arc<Entry>> = self
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .clone();

        for entry in snapshot {
            if entry.active.load(Ordering::Acquire) {
                (entry.callback)(status);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Subscription {
    /// Removes the listener. Safe to call from inside a notification.
    pub fn unsubscribe(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(|e| e.into_inner());
        registry.entries.retain(|entry| {
            if entry.id == self.id {
                entry.active.store(false, Ordering::Release);
                false
            } else {
                true
            }
        });
    }
}

impl std::fmt::Debug for StatusListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusListeners")
            .field("listeners", &self.len())
            .finish()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "listeners_tests.rs"]
mod tests;
