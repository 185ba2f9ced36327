// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! External collaborators consumed by the session layer.
//!
//! - [`IdentitySource`] - who is signed in (authentication layer)
//! - [`VehicleDirectory`] - bulk lookup of active vehicles (REST layer)
//! - [`PositionProvider`] - the device's own location
//!
//! All three are object-safe so the coordinator can hold them as
//! `Arc<dyn ...>` and tests can substitute in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use busline_core::{AccountIdentity, VehiclePosition};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::error::{DirectoryError, IdentityError, ProviderError};

/// Boxed future returned by collaborator methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Authentication collaborator.
pub trait IdentitySource: Send + Sync {
    /// Looks up the signed-in account. Not retried by the coordinator.
    fn identity(&self) -> BoxFuture<'_, Result<AccountIdentity, IdentityError>>;
}

/// Read-only bulk vehicle lookup used by the full resync.
pub trait VehicleDirectory: Send + Sync {
    /// Lists every vehicle the backend considers active for an organization.
    fn list_active_vehicles<'a>(
        &'a self,
        organization_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<VehiclePosition>, DirectoryError>>;
}

/// One reading from the device's location source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

impl PositionFix {
    /// A fix recorded now.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        PositionFix {
            latitude,
            longitude,
            recorded_at: Utc::now(),
        }
    }
}

/// Stream of readings from a continuous location subscription.
pub type FixStream = mpsc::Receiver<Result<PositionFix, ProviderError>>;

/// The device's location source.
pub trait PositionProvider: Send + Sync {
    /// Requests one fresh reading.
    fn current_position(&self) -> BoxFuture<'_, Result<PositionFix, ProviderError>>;

    /// Starts a continuous subscription, if the source supports one.
    ///
    /// The subscription ends when the returned receiver is dropped.
    fn watch_positions(&self) -> Option<FixStream> {
        None
    }
}
