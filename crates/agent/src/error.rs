// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors that stop the agent before a session starts.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    #[error(transparent)]
    Session(#[from] busline::ConfigError),

    #[error("invalid directory url '{0}'\n  hint: url must start with http:// or https://")]
    InvalidDirectoryUrl(String),

    #[error("invalid position {latitude}, {longitude}\n  hint: use real coordinates, not the 0,0 placeholder")]
    InvalidPosition { latitude: f64, longitude: f64 },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
