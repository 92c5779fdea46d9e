//! Access-token claims.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tollgate_core::types::UserId;
use tollgate_entity::Capability;

/// Payload of every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject, the user ID.
    pub sub: UserId,
    /// Email of the user at issuance.
    pub email: String,
    /// One entry per held capability.
    #[serde(default)]
    pub role: Vec<Capability>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

impl AccessClaims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Identity recovered from a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessIdentity {
    pub user_id: UserId,
    pub email: String,
    pub capabilities: BTreeSet<Capability>,
}

impl From<AccessClaims> for AccessIdentity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            capabilities: claims.role.into_iter().collect(),
        }
    }
}
