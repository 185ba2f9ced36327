// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session identity.
//!
//! The authentication layer hands us an [`AccountIdentity`] (email plus
//! organization). The session layer scopes every outbound message with the
//! derived [`SessionIdentity`]; the email doubles as the user ID.

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identity as reported by the authentication collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountIdentity {
    pub email: String,
    pub organization_id: String,
}

impl AccountIdentity {
    pub fn new(email: impl Into<String>, organization_id: impl Into<String>) -> Self {
        AccountIdentity {
            email: email.into(),
            organization_id: organization_id.into(),
        }
    }
}

/// The authenticated user/organization pair scoping a session.
///
/// Immutable once derived; a new session derives a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionIdentity {
    pub user_id: String,
    pub organization_id: String,
}

impl SessionIdentity {
    /// Builds an identity, rejecting blank components.
    pub fn new(user_id: impl Into<String>, organization_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into().trim().to_string();
        let organization_id = organization_id.into().trim().to_string();

        if user_id.is_empty() {
            return Err(Error::IncompleteIdentity("user id"));
        }
        if organization_id.is_empty() {
            return Err(Error::IncompleteIdentity("organization id"));
        }

        Ok(SessionIdentity {
            user_id,
            organization_id,
        })
    }
}

impl TryFrom<AccountIdentity> for SessionIdentity {
    type Error = Error;

    fn try_from(account: AccountIdentity) -> Result<Self> {
        SessionIdentity::new(account.email, account.organization_id)
    }
}

impl std::fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user_id, self.organization_id)
    }
}
