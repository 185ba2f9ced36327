// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! busline - Client-side real-time session layer for transit tracking.
//!
//! Keeps a live table of vehicle positions for one organization in sync with
//! the backend over a WebSocket subscription, and reports the device's own
//! position back.
//!
//! # Main Components
//!
//! - [`SessionCoordinator`] - owns the connection, reconciliation and every timer
//! - [`PositionStore`] - read/observe handle to the vehicle position table
//! - [`LifecycleBridge`] - forwards foreground/background transitions
//! - [`channel`] - the transport channel and the [`Transport`] seam
//! - [`services`] - collaborator traits (identity, bulk lookup, device position)
//!
//! # Usage
//!
//! ```rust,ignore
//! use busline::{Collaborators, SessionConfig, SessionCoordinator, WebSocketTransport};
//!
//! let coordinator = SessionCoordinator::new(
//!     SessionConfig::load(path)?,
//!     Collaborators {
//!         identity,
//!         directory,
//!         provider,
//!         transport: WebSocketTransport::factory(),
//!     },
//! );
//!
//! coordinator.subscribe(|open| println!("connected: {open}"));
//! if coordinator.initialize().await {
//!     let mut positions = coordinator.positions().watch();
//!     while positions.changed().await.is_ok() {
//!         render(&positions.borrow_and_update());
//!     }
//! }
//! ```

pub mod backoff;
pub mod channel;
pub mod config;
pub mod error;
pub mod listeners;
pub mod services;
mod session;
pub mod store;

pub use backoff::Backoff;
pub use channel::{Transport, TransportError, TransportFactory, WebSocketTransport};
pub use config::{ReconnectConfig, ReportStrategy, ReportingConfig, SessionConfig};
pub use error::{ConfigError, DirectoryError, IdentityError, ProviderError};
pub use listeners::Subscription;
pub use services::{IdentitySource, PositionFix, PositionProvider, VehicleDirectory};
pub use session::{
    spawn_bridge, AppState, Collaborators, ConnectionState, LifecycleBridge, Notice,
    SessionCoordinator,
};
pub use store::{PositionStore, VehicleTable};

pub use busline_core::{
    AccountIdentity, BoardingAction, BoardingState, BoardingStatus, SessionIdentity,
    VehiclePosition,
};
