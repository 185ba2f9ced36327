// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborators backed by the agent's configuration and a REST endpoint.

use busline::services::BoxFuture;
use busline::{
    AccountIdentity, DirectoryError, IdentityError, IdentitySource, PositionFix,
    PositionProvider, ProviderError, VehicleDirectory, VehiclePosition,
};
use tracing::debug;

use crate::config::{DirectoryConfig, IdentityConfig, PositionConfig};
use crate::error::Result;

/// Identity read from the config file; always signed in.
pub struct ConfiguredIdentity {
    account: AccountIdentity,
}

impl ConfiguredIdentity {
    pub fn new(config: &IdentityConfig) -> Self {
        ConfiguredIdentity {
            account: AccountIdentity::new(&config.email, &config.organization_id),
        }
    }
}

impl IdentitySource for ConfiguredIdentity {
    fn identity(&self) -> BoxFuture<'_, std::result::Result<AccountIdentity, IdentityError>> {
        let account = self.account.clone();
        Box::pin(async move { Ok(account) })
    }
}

/// Bulk vehicle lookup over HTTP.
///
/// Expects a JSON array of vehicle objects in the wire shape of a
/// `vehicle_update` (without the `type` field).
pub struct HttpDirectory {
    http: reqwest::Client,
    config: DirectoryConfig,
}

impl HttpDirectory {
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(HttpDirectory { http, config })
    }
}

impl VehicleDirectory for HttpDirectory {
    fn list_active_vehicles<'a>(
        &'a self,
        organization_id: &'a str,
    ) -> BoxFuture<'a, std::result::Result<Vec<VehiclePosition>, DirectoryError>> {
        Box::pin(async move {
            let url = self.config.url_for(organization_id);
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| DirectoryError::Request(e.to_string()))?;

            let bytes = response
                .bytes()
                .await
                .map_err(|e| DirectoryError::Request(e.to_string()))?;

            let vehicles = decode_vehicles(&bytes)?;
            debug!(url = %url, vehicles = vehicles.len(), "vehicle directory fetched");
            Ok(vehicles)
        })
    }
}

/// Parses a directory response body.
pub fn decode_vehicles(body: &[u8]) -> std::result::Result<Vec<VehiclePosition>, DirectoryError> {
    serde_json::from_slice(body).map_err(|e| DirectoryError::Decode(e.to_string()))
}

/// Reports the configured position on every request.
pub struct FixedPosition {
    position: PositionConfig,
}

impl FixedPosition {
    pub fn new(position: PositionConfig) -> Self {
        FixedPosition { position }
    }
}

impl PositionProvider for FixedPosition {
    fn current_position(&self) -> BoxFuture<'_, std::result::Result<PositionFix, ProviderError>> {
        let fix = PositionFix::now(self.position.latitude, self.position.longitude);
        Box::pin(async move { Ok(fix) })
    }
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;
