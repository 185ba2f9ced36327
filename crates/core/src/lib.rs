// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! busline-core: Shared data model for the busline session layer
//!
//! This crate provides the wire protocol, vehicle positions, and session
//! identity used by both the client library and the agent binary.

pub mod error;
pub mod identity;
pub mod protocol;
pub mod vehicle;

pub use error::{Error, Result};
pub use identity::{AccountIdentity, SessionIdentity};
pub use protocol::{BoardingAction, BoardingState, BoardingStatus, ClientMessage, ServerMessage};
pub use vehicle::{is_valid_coordinate, VehiclePosition};
