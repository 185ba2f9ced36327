// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration file.
//!
//! ```toml
//! [session]
//! endpoint = "wss://transit.example.com/ws/location/{organization_id}"
//!
//! [identity]
//! email = "rider@example.com"
//! organization_id = "org1"
//!
//! [directory]
//! url = "https://transit.example.com/api/organizations/{organization_id}/vehicles"
//!
//! [position]
//! latitude = 37.5665
//! longitude = 126.978
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use busline::config::ORGANIZATION_PLACEHOLDER;
use busline::SessionConfig;
use busline_core::is_valid_coordinate;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default)]
    pub session: SessionConfig,
    pub identity: IdentityConfig,
    pub directory: DirectoryConfig,
    pub position: PositionConfig,
}

/// The account the agent signs in as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConfig {
    pub email: String,
    pub organization_id: String,
}

/// REST endpoint listing an organization's active vehicles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectoryConfig {
    /// URL template; `{organization_id}` is substituted.
    pub url: String,
    /// Request timeout in milliseconds (default: 10000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Where the agent reports itself to be.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PositionConfig {
    pub latitude: f64,
    pub longitude: f64,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| AgentError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.session.validate()?;

        let url = &self.directory.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AgentError::InvalidDirectoryUrl(url.clone()));
        }

        let PositionConfig {
            latitude,
            longitude,
        } = self.position;
        if !is_valid_coordinate(latitude, longitude) {
            return Err(AgentError::InvalidPosition {
                latitude,
                longitude,
            });
        }
        Ok(())
    }
}

impl DirectoryConfig {
    pub fn url_for(&self, organization_id: &str) -> String {
        self.url.replace(ORGANIZATION_PLACEHOLDER, organization_id)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
