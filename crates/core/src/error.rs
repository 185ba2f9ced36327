// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for busline-core operations.

use thiserror::Error;

/// All possible errors that can occur in busline-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("incomplete session identity: missing {0}")]
    IncompleteIdentity(&'static str),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognized message: {0}")]
    UnrecognizedMessage(String),
}

/// A specialized Result type for busline-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
