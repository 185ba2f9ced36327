// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session configuration.
//!
//! Configuration is usually embedded in the host application's TOML file
//! under a `[session]` table and includes:
//! - `endpoint`: WebSocket URL template (`{organization_id}` is substituted)
//! - timer cadences for heartbeat, full resync and restart settling
//! - `[reconnect]`: exponential backoff parameters
//! - `[reporting]`: position reporting strategy and cadence

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::backoff::Backoff;
use crate::error::ConfigError;

/// Placeholder replaced by the session's organization in [`SessionConfig::endpoint`].
pub const ORGANIZATION_PLACEHOLDER: &str = "{organization_id}";

/// Configuration for one [`SessionCoordinator`](crate::SessionCoordinator).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Subscription endpoint template.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Heartbeat interval while the channel is open (default: 60000).
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Full resync cadence (default: 60000).
    #[serde(default = "default_resync_interval_ms")]
    pub resync_interval_ms: u64,
    /// Pause between teardown and re-initialization on restart (default: 1000).
    #[serde(default = "default_restart_settle_ms")]
    pub restart_settle_ms: u64,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Reconnection backoff parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first retry in milliseconds (default: 1000).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay in milliseconds (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Retries scheduled before giving up (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// How the device's position is sampled for reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStrategy {
    /// Request one fresh reading per tick.
    #[default]
    Poll,
    /// Consume the provider's continuous stream, throttled to the cadence.
    Watch,
}

/// Position reporting parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportingConfig {
    #[serde(default)]
    pub strategy: ReportStrategy,
    /// Desired reporting cadence in milliseconds (default: 10000).
    #[serde(default = "default_report_interval_ms")]
    pub interval_ms: u64,
    /// Minimum interval the server accepts between reports (default: 5000).
    ///
    /// The effective cadence never goes below this.
    #[serde(default = "default_server_min_interval_ms")]
    pub server_min_interval_ms: u64,
}

fn default_endpoint() -> String {
    format!("ws://localhost:8080/ws/location/{}", ORGANIZATION_PLACEHOLDER)
}

fn default_heartbeat_interval_ms() -> u64 {
    60_000
}

fn default_resync_interval_ms() -> u64 {
    60_000
}

fn default_restart_settle_ms() -> u64 {
    1_000
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_report_interval_ms() -> u64 {
    10_000
}

fn default_server_min_interval_ms() -> u64 {
    5_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            endpoint: default_endpoint(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            resync_interval_ms: default_resync_interval_ms(),
            restart_settle_ms: default_restart_settle_ms(),
            reconnect: ReconnectConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        ReportingConfig {
            strategy: ReportStrategy::default(),
            interval_ms: default_report_interval_ms(),
            server_min_interval_ms: default_server_min_interval_ms(),
        }
    }
}

impl SessionConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the endpoint scheme and that every cadence is non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("ws://") && !self.endpoint.starts_with("wss://") {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }

        let intervals = [
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("resync_interval_ms", self.resync_interval_ms),
            ("reconnect.initial_delay_ms", self.reconnect.initial_delay_ms),
            ("reconnect.max_delay_ms", self.reconnect.max_delay_ms),
            ("reporting.interval_ms", self.reporting.interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::ZeroInterval(name));
            }
        }
        Ok(())
    }

    /// Resolves the endpoint template for an organization.
    pub fn endpoint_for(&self, organization_id: &str) -> String {
        self.endpoint
            .replace(ORGANIZATION_PLACEHOLDER, organization_id)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_millis(self.resync_interval_ms)
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }

    /// Builds a fresh backoff policy from the reconnect settings.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.reconnect.initial_delay_ms),
            Duration::from_millis(self.reconnect.max_delay_ms),
            self.reconnect.max_attempts,
        )
    }
}

impl ReportingConfig {
    /// The cadence actually used: never tighter than the server's minimum.
    pub fn effective_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(self.server_min_interval_ms))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
