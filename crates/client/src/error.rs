// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the session layer's collaborators and configuration.
//!
//! None of these cross the [`SessionCoordinator`](crate::SessionCoordinator)
//! boundary: the coordinator logs them and reports through status values,
//! listeners and notices instead.

use thiserror::Error;

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid endpoint '{0}'\n  hint: endpoint must start with ws:// or wss://")]
    InvalidEndpoint(String),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Failure of the authentication collaborator.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("identity lookup failed: {0}")]
    Lookup(String),

    #[error(transparent)]
    Incomplete(#[from] busline_core::Error),
}

/// Failure of the bulk vehicle lookup collaborator.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("vehicle lookup request failed: {0}")]
    Request(String),

    #[error("vehicle lookup returned an unreadable response: {0}")]
    Decode(String),
}

/// Failure to obtain a position reading.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("position request timed out")]
    Timeout,
}
