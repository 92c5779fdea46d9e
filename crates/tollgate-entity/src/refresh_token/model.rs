//! Refresh token record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An opaque, store-validated refresh token.
///
/// `replaced_by_token` links a rotated token to its successor; across one
/// user's collection these links form a forest with at most one child per
/// node. Expiry is derived from `expires_at`, revocation is stored and
/// terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// The bearer value.
    pub token: String,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// When the token stops being usable.
    pub expires_at: DateTime<Utc>,
    /// Address of the client the token was issued to.
    pub created_by_ip: String,
    /// When the token was revoked, if ever.
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
    /// Address of the client that caused the revocation.
    #[serde(default)]
    pub revoked_by_ip: Option<String>,
    /// Why the token was revoked.
    #[serde(default)]
    pub revocation_reason: Option<String>,
    /// The next token in the rotation chain.
    #[serde(default)]
    pub replaced_by_token: Option<String>,
}

impl RefreshToken {
    /// Create a token issued at `now` that lives for `lifetime`.
    pub fn new(
        token: String,
        now: DateTime<Utc>,
        lifetime: Duration,
        created_by_ip: impl Into<String>,
    ) -> Self {
        Self {
            token,
            created_at: now,
            expires_at: now + lifetime,
            created_by_ip: created_by_ip.into(),
            revoked_at: None,
            revoked_by_ip: None,
            revocation_reason: None,
            replaced_by_token: None,
        }
    }

    /// Whether the token has passed its expiration time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the token was revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Active ⇔ never revoked and not yet expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }

    /// Mark the token revoked. A token that is already revoked keeps its
    /// original revocation record.
    pub fn revoke(&mut self, now: DateTime<Utc>, ip: &str, reason: impl Into<String>) {
        if self.is_revoked() {
            return;
        }
        self.revoked_at = Some(now);
        self.revoked_by_ip = Some(ip.to_string());
        self.revocation_reason = Some(reason.into());
    }
}
