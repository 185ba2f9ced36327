// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Observable table of known vehicle positions.
//!
//! The table is keyed by vehicle ID and published as immutable snapshots
//! through a [`tokio::sync::watch`] channel, so any number of readers can
//! observe it while the session coordinator remains the only writer.
//!
//! Invariants upheld by every write:
//! - no entry has placeholder or otherwise invalid coordinates
//! - no entry has `in_service == false` once the write completes

use std::collections::BTreeMap;
use std::sync::Arc;

use busline_core::VehiclePosition;
use tokio::sync::watch;

/// Snapshot of the position table.
pub type VehicleTable = BTreeMap<String, VehiclePosition>;

/// Result of applying one incremental update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New vehicle added.
    Inserted,
    /// Existing entry replaced.
    Updated,
    /// Update marked the vehicle out of service; its entry was removed.
    Evicted,
    /// Out-of-service update for a vehicle not in the table.
    Ignored,
    /// Coordinates were invalid; table untouched.
    Rejected,
}

/// Process-wide vehicle position table.
///
/// Cloning yields another handle to the same table. Mutation is crate-private:
/// outside this crate the store is read/observe only.
#[derive(Clone)]
pub struct PositionStore {
    tx: Arc<watch::Sender<Arc<VehicleTable>>>,
}

impl PositionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(VehicleTable::new()));
        PositionStore { tx: Arc::new(tx) }
    }

    /// Current table.
    pub fn snapshot(&self) -> Arc<VehicleTable> {
        Arc::clone(&self.tx.borrow())
    }

    /// Position of one vehicle, if known.
    pub fn get(&self, vehicle_id: &str) -> Option<VehiclePosition> {
        self.tx.borrow().get(vehicle_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Subscribes to table changes.
    ///
    /// The receiver sees the latest snapshot; intermediate snapshots may be
    /// skipped if the reader falls behind.
    pub fn watch(&self) -> watch::Receiver<Arc<VehicleTable>> {
        self.tx.subscribe()
    }

    /// Applies one incremental update.
    ///
    /// The update replaces any existing entry for the vehicle, then the whole
    /// table is filtered to in-service vehicles before publication.
    pub(crate) fn upsert(&self, position: VehiclePosition) -> UpsertOutcome {
        if !position.has_valid_coordinates() {
            return UpsertOutcome::Rejected;
        }

        let mut outcome = UpsertOutcome::Ignored;
        self.tx.send_if_modified(|table| {
            let known = table.contains_key(&position.vehicle_id);
            if !known && !position.in_service {
                return false;
            }

            let table = Arc::make_mut(table);
            let in_service = position.in_service;
            table.insert(position.vehicle_id.clone(), position);
            table.retain(|_, v| v.in_service);

            outcome = match (known, in_service) {
                (false, _) => UpsertOutcome::Inserted,
                (true, true) => UpsertOutcome::Updated,
                (true, false) => UpsertOutcome::Evicted,
            };
            true
        });
        outcome
    }

    /// Replaces the whole table, applying the same filters as [`upsert`](Self::upsert).
    ///
    /// Returns the number of vehicles kept.
    pub(crate) fn replace(&self, positions: impl IntoIterator<Item = VehiclePosition>) -> usize {
        let table: VehicleTable = positions
            .into_iter()
            .filter(|p| p.has_valid_coordinates() && p.in_service)
            .map(|p| (p.vehicle_id.clone(), p))
            .collect();
        let kept = table.len();
        self.tx.send_replace(Arc::new(table));
        kept
    }

    /// Empties the table.
    pub(crate) fn clear(&self) {
        self.tx.send_if_modified(|table| {
            if table.is_empty() {
                return false;
            }
            *table = Arc::new(VehicleTable::new());
            true
        });
    }
}

impl Default for PositionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PositionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionStore")
            .field("vehicles", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
