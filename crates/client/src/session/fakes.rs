// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory collaborators for session tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use busline_core::{AccountIdentity, VehiclePosition};

use crate::error::{DirectoryError, IdentityError, ProviderError};
use crate::services::{
    BoxFuture, FixStream, IdentitySource, PositionFix, PositionProvider, VehicleDirectory,
};

/// Identity source returning a configurable account.
pub struct FakeIdentity {
    account: Mutex<Option<AccountIdentity>>,
    calls: AtomicU32,
}

impl FakeIdentity {
    pub fn signed_in(email: &str, organization_id: &str) -> Self {
        FakeIdentity {
            account: Mutex::new(Some(AccountIdentity::new(email, organization_id))),
            calls: AtomicU32::new(0),
        }
    }

    pub fn signed_out() -> Self {
        FakeIdentity {
            account: Mutex::new(None),
            calls: AtomicU32::new(0),
        }
    }

    pub fn set(&self, account: Option<AccountIdentity>) {
        *self.account.lock().unwrap() = account;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdentitySource for FakeIdentity {
    fn identity(&self) -> BoxFuture<'_, Result<AccountIdentity, IdentityError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let account = self.account.lock().unwrap().clone();
        Box::pin(async move { account.ok_or(IdentityError::NotSignedIn) })
    }
}

/// Vehicle directory serving a fixed list, optionally after a delay.
#[derive(Default)]
pub struct FakeDirectory {
    vehicles: Mutex<Vec<VehiclePosition>>,
    delay: Mutex<Duration>,
    fail: AtomicBool,
    calls: AtomicU32,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicles(vehicles: Vec<VehiclePosition>) -> Self {
        let directory = Self::default();
        directory.set_vehicles(vehicles);
        directory
    }

    pub fn set_vehicles(&self, vehicles: Vec<VehiclePosition>) {
        *self.vehicles.lock().unwrap() = vehicles;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VehicleDirectory for FakeDirectory {
    fn list_active_vehicles<'a>(
        &'a self,
        _organization_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<VehiclePosition>, DirectoryError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let vehicles = self.vehicles.lock().unwrap().clone();
        let delay = *self.delay.lock().unwrap();
        let fail = self.fail.load(Ordering::SeqCst);

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(DirectoryError::Request("fake outage".into()));
            }
            Ok(vehicles)
        })
    }
}

/// Position provider answering every request with the same reading.
pub struct FakeProvider {
    position: Mutex<Option<(f64, f64)>>,
    stream: Mutex<Option<FixStream>>,
    requests: AtomicU32,
}

impl FakeProvider {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        FakeProvider {
            position: Mutex::new(Some((latitude, longitude))),
            stream: Mutex::new(None),
            requests: AtomicU32::new(0),
        }
    }

    /// Provider whose every request fails.
    pub fn unavailable() -> Self {
        FakeProvider {
            position: Mutex::new(None),
            stream: Mutex::new(None),
            requests: AtomicU32::new(0),
        }
    }

    /// Offers `stream` to the first caller of `watch_positions`.
    pub fn with_stream(self, stream: FixStream) -> Self {
        *self.stream.lock().unwrap() = Some(stream);
        self
    }

    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PositionProvider for FakeProvider {
    fn current_position(&self) -> BoxFuture<'_, Result<PositionFix, ProviderError>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let position = *self.position.lock().unwrap();
        Box::pin(async move {
            position
                .map(|(lat, lon)| PositionFix::now(lat, lon))
                .ok_or_else(|| ProviderError::Unavailable("no fix".into()))
        })
    }

    fn watch_positions(&self) -> Option<FixStream> {
        self.stream.lock().unwrap().take()
    }
}
