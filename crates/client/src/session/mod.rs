// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle: coordinator, position reporter and app lifecycle bridge.

mod coordinator;
mod lifecycle;
mod reporter;
mod state;

pub use coordinator::{Collaborators, Notice, SessionCoordinator};
pub use lifecycle::{spawn_bridge, AppState, LifecycleBridge};
pub use state::ConnectionState;

#[cfg(test)]
pub(crate) mod fakes;
