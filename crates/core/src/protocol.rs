// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for the location channel.
//!
//! The protocol is simple:
//! - Client subscribes to its organization, reports its own location and
//!   boarding actions, and keeps the connection alive with heartbeats
//! - Server confirms the connection and broadcasts vehicle and boarding updates
//!
//! Every frame is a JSON object with a `type` discriminator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vehicle::VehiclePosition;

/// A rider's action on a vehicle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoardingAction {
    Board,
    Alight,
}

impl std::fmt::Display for BoardingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardingAction::Board => write!(f, "board"),
            BoardingAction::Alight => write!(f, "alight"),
        }
    }
}

/// Boarding state reported by the server.
///
/// Unknown states are carried through verbatim so newer servers do not
/// break older clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum BoardingState {
    Boarded,
    Alighted,
    Unknown(String),
}

impl From<String> for BoardingState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "boarded" => BoardingState::Boarded,
            "alighted" => BoardingState::Alighted,
            _ => BoardingState::Unknown(s),
        }
    }
}

impl From<BoardingState> for String {
    fn from(state: BoardingState) -> Self {
        match state {
            BoardingState::Boarded => "boarded".to_string(),
            BoardingState::Alighted => "alighted".to_string(),
            BoardingState::Unknown(s) => s,
        }
    }
}

/// Latest boarding status for the current rider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardingStatus {
    pub vehicle_id: String,
    pub state: BoardingState,
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to the organization's vehicle broadcasts.
    ///
    /// Must be the first message on every connection.
    Subscribe { organization_id: String },

    /// The device's own position.
    LocationReport {
        user_id: String,
        organization_id: String,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    },

    /// Rider boarded or left a vehicle.
    BoardingAction {
        vehicle_id: String,
        organization_id: String,
        user_id: String,
        action: BoardingAction,
    },

    /// Keepalive.
    Heartbeat,

    /// Ask for the current status of one vehicle or the whole organization.
    StatusQuery {
        organization_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vehicle_id: Option<String>,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake acknowledgement.
    ConnectionEstablished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// A vehicle moved or changed service state.
    VehicleUpdate(VehiclePosition),

    /// The rider's boarding state changed.
    BoardingUpdate {
        status: BoardingState,
        vehicle_id: String,
    },

    /// Reply to a client heartbeat.
    HeartbeatResponse,

    /// Error message.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Subscribe message.
    pub fn subscribe(organization_id: impl Into<String>) -> Self {
        ClientMessage::Subscribe {
            organization_id: organization_id.into(),
        }
    }

    /// Creates a LocationReport message.
    pub fn location_report(
        user_id: impl Into<String>,
        organization_id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        ClientMessage::LocationReport {
            user_id: user_id.into(),
            organization_id: organization_id.into(),
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Creates a BoardingAction message.
    pub fn boarding_action(
        vehicle_id: impl Into<String>,
        organization_id: impl Into<String>,
        user_id: impl Into<String>,
        action: BoardingAction,
    ) -> Self {
        ClientMessage::BoardingAction {
            vehicle_id: vehicle_id.into(),
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            action,
        }
    }

    /// Creates a Heartbeat message.
    pub fn heartbeat() -> Self {
        ClientMessage::Heartbeat
    }

    /// Creates a StatusQuery message.
    pub fn status_query(organization_id: impl Into<String>, vehicle_id: Option<String>) -> Self {
        ClientMessage::StatusQuery {
            organization_id: organization_id.into(),
            vehicle_id,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a ConnectionEstablished message.
    pub fn connection_established() -> Self {
        ServerMessage::ConnectionEstablished { message: None }
    }

    /// Creates a VehicleUpdate message.
    pub fn vehicle_update(position: VehiclePosition) -> Self {
        ServerMessage::VehicleUpdate(position)
    }

    /// Creates a BoardingUpdate message.
    pub fn boarding_update(status: BoardingState, vehicle_id: impl Into<String>) -> Self {
        ServerMessage::BoardingUpdate {
            status,
            vehicle_id: vehicle_id.into(),
        }
    }

    /// Creates a HeartbeatResponse message.
    pub fn heartbeat_response() -> Self {
        ServerMessage::HeartbeatResponse
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Interprets an already-parsed JSON value.
    ///
    /// Fails with [`Error::UnrecognizedMessage`] naming the `type` field (or
    /// its absence) when the value is not one of the known shapes.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .map(str::to_string);

        serde_json::from_value(value).map_err(|e| match kind {
            Some(kind) => Error::UnrecognizedMessage(format!("type '{}': {}", kind, e)),
            None => Error::UnrecognizedMessage("missing 'type' field".to_string()),
        })
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
