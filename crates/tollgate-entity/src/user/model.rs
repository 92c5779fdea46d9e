//! User aggregate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tollgate_core::types::UserId;

use super::capability::Capability;
use crate::refresh_token::RefreshToken;

/// A registered user together with the refresh tokens it owns.
///
/// The whole struct is persisted as one document and replaced as a unit.
/// `version` is maintained by the store for conditional replaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Login email address.
    pub email: String,
    /// Stored credential digest.
    pub password_hash: String,
    /// Granted capabilities (already expanded).
    pub capabilities: BTreeSet<Capability>,
    /// Every refresh token issued to this user that has not been cleaned up.
    #[serde(default)]
    pub refresh_tokens: Vec<RefreshToken>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// Optimistic-concurrency version, owned by the store.
    #[serde(default)]
    pub version: i64,
}

impl User {
    /// Build a new user with no refresh tokens.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        capabilities: BTreeSet<Capability>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            capabilities,
            refresh_tokens: Vec::new(),
            created_at: now,
            version: 0,
        }
    }

    /// Find a refresh token record by its token string.
    pub fn refresh_token(&self, token: &str) -> Option<&RefreshToken> {
        self.refresh_tokens.iter().find(|t| t.token == token)
    }

    /// Mutable lookup of a refresh token record.
    pub fn refresh_token_mut(&mut self, token: &str) -> Option<&mut RefreshToken> {
        self.refresh_tokens.iter_mut().find(|t| t.token == token)
    }

    /// Refresh tokens still usable at `now`.
    pub fn active_refresh_tokens(&self, now: DateTime<Utc>) -> impl Iterator<Item = &RefreshToken> {
        self.refresh_tokens.iter().filter(move |t| t.is_active_at(now))
    }

    /// Whether the user holds `capability`.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// The public projection of this user.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            capabilities: self.capabilities.clone(),
        }
    }
}

/// User identity returned alongside issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User id.
    pub id: UserId,
    /// Email address.
    pub email: String,
    /// Granted capabilities.
    pub capabilities: BTreeSet<Capability>,
}
