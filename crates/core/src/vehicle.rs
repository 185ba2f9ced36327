// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Vehicle positions as broadcast by the backend.
//!
//! A [`VehiclePosition`] is the unit of the client-side position table. Two
//! rules decide whether a position may enter the table at all:
//!
//! - its coordinates must be valid (see [`is_valid_coordinate`])
//! - it must be in service once the table is filtered

use serde::{Deserialize, Serialize};

/// Half-width of the band around (0, 0) treated as a placeholder fix.
///
/// Backends and GPS units report `0.0, 0.0` (or values very close to it)
/// when they have no real fix. Nothing we track operates in the Gulf of Guinea.
pub const ORIGIN_BAND_DEGREES: f64 = 0.1;

/// Last known position of one vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehiclePosition {
    /// Backend identifier; unique within the table.
    pub vehicle_id: String,
    /// Human-facing identifier (plate or fleet number), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// False once the vehicle has been retired from active service.
    #[serde(default = "default_in_service")]
    pub in_service: bool,
}

fn default_in_service() -> bool {
    true
}

impl VehiclePosition {
    /// Creates an in-service position without a display ID.
    pub fn new(vehicle_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        VehiclePosition {
            vehicle_id: vehicle_id.into(),
            display_id: None,
            latitude,
            longitude,
            in_service: true,
        }
    }

    /// Sets the display ID.
    pub fn with_display_id(mut self, display_id: impl Into<String>) -> Self {
        self.display_id = Some(display_id.into());
        self
    }

    /// Sets the in-service flag.
    pub fn with_in_service(mut self, in_service: bool) -> Self {
        self.in_service = in_service;
        self
    }

    /// Returns true if this position's coordinates are usable.
    pub fn has_valid_coordinates(&self) -> bool {
        is_valid_coordinate(self.latitude, self.longitude)
    }
}

/// Returns true if `(latitude, longitude)` is a real, plottable fix.
///
/// Rejects:
/// - pairs where both components lie within [`ORIGIN_BAND_DEGREES`] of zero
/// - non-finite components
/// - latitude outside ±90 or longitude outside ±180
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    if !latitude.is_finite() || !longitude.is_finite() {
        return false;
    }
    if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return false;
    }
    !(latitude.abs() < ORIGIN_BAND_DEGREES && longitude.abs() < ORIGIN_BAND_DEGREES)
}

#[cfg(test)]
#[path = "vehicle_tests.rs"]
mod tests;
