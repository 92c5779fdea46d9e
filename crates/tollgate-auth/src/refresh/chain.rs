//! Refresh-token rotation with replay detection.
//!
//! Each user owns a forest of refresh tokens linked by
//! `replaced_by_token`. Presenting a token that was already rotated away is
//! treated as theft: every still-active descendant is revoked before the
//! request is rejected.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{info, warn};

use tollgate_core::RetryPolicy;
use tollgate_core::config::AuthConfig;
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::Clock;
use tollgate_database::UserStore;
use tollgate_entity::{RefreshToken, User, token_fingerprint};

/// Number of random bytes in a refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 64;

/// Revocation reason recorded on a rotated token.
pub const REASON_REPLACED: &str = "Replaced by new token";

/// Revocation reason recorded on an explicit logout.
pub const REASON_REVOKED: &str = "Revoked without replacement";

/// Owns generation, rotation, revocation, and cleanup of refresh tokens.
#[derive(Clone)]
pub struct RefreshTokenChain {
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    retention: Duration,
    retry: RetryPolicy,
}

impl std::fmt::Debug for RefreshTokenChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenChain")
            .field("lifetime", &self.lifetime)
            .field("retention", &self.retention)
            .field("retry", &self.retry)
            .finish()
    }
}

impl RefreshTokenChain {
    pub fn new(
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            users,
            clock,
            lifetime: Duration::days(config.refresh_token_ttl_days),
            retention: Duration::days(config.refresh_token_retention_days),
            retry,
        }
    }

    /// A fresh token issued now to `ip`.
    pub fn generate(&self, ip: &str) -> RefreshToken {
        self.generate_at(ip, self.clock.now())
    }

    fn generate_at(&self, ip: &str, now: DateTime<Utc>) -> RefreshToken {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        RefreshToken::new(STANDARD.encode(bytes), now, self.lifetime, ip)
    }

    /// Revoke `current` and link it to a newly generated successor.
    pub fn rotate(&self, current: &mut RefreshToken, ip: &str) -> RefreshToken {
        self.rotate_at(current, ip, self.clock.now())
    }

    fn rotate_at(&self, current: &mut RefreshToken, ip: &str, now: DateTime<Utc>) -> RefreshToken {
        let fresh = self.generate_at(ip, now);
        current.revoke(now, ip, REASON_REPLACED);
        current.replaced_by_token = Some(fresh.token.clone());
        fresh
    }

    /// Tokens reachable from `token` by following replacement links, in chain
    /// order. `token` itself is not included.
    ///
    /// Links are indexed once per walk. The walk is bounded by the size of
    /// the collection and stops at the first repeated or missing link.
    pub fn descendants(user: &User, token: &str) -> Vec<String> {
        let successors: HashMap<&str, &str> = user
            .refresh_tokens
            .iter()
            .filter_map(|t| Some((t.token.as_str(), t.replaced_by_token.as_deref()?)))
            .collect();

        let mut chain = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([token]);
        let mut cursor = successors.get(token).copied();

        while let Some(next) = cursor {
            if chain.len() >= user.refresh_tokens.len() || !visited.insert(next) {
                break;
            }
            chain.push(next.to_string());
            cursor = successors.get(next).copied();
        }
        chain
    }

    /// Revoke every active descendant of `token`. Returns how many were revoked.
    fn revoke_descendants(
        &self,
        user: &mut User,
        token: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> usize {
        let reason = format!("Attempted reuse of revoked ancestor token: {token}");
        let mut revoked = 0;
        for descendant in Self::descendants(user, token) {
            if let Some(record) = user.refresh_token_mut(&descendant) {
                if record.is_active_at(now) {
                    record.revoke(now, ip, reason.as_str());
                    revoked += 1;
                }
            }
        }
        revoked
    }

    /// Drop tokens that are inactive and older than the retention window.
    /// Returns how many were removed.
    pub fn cleanup(&self, user: &mut User) -> usize {
        self.cleanup_at(user, self.clock.now())
    }

    pub(crate) fn cleanup_at(&self, user: &mut User, now: DateTime<Utc>) -> usize {
        let before = user.refresh_tokens.len();
        let retention = self.retention;
        user.refresh_tokens
            .retain(|t| t.is_active_at(now) || t.created_at + retention > now);
        before - user.refresh_tokens.len()
    }

    /// Exchange `token` for its successor.
    ///
    /// Fails `UserNotFound` when no user owns the token and `InvalidToken`
    /// when it is expired or revoked. A revoked token also revokes its whole
    /// active descendant chain, which is persisted before the failure is
    /// returned.
    pub async fn refresh(&self, token: &str, ip: &str) -> AppResult<(RefreshToken, User)> {
        self.retry
            .run("refresh_token", || self.try_refresh(token, ip))
            .await
    }

    async fn try_refresh(&self, token: &str, ip: &str) -> AppResult<(RefreshToken, User)> {
        let mut user = self
            .users
            .get_user_by_refresh_token(token)
            .await?
            .ok_or_else(|| AppError::user_not_found("No user owns the presented refresh token"))?;
        let user_id = user.id;
        let now = self.clock.now();

        let Some(current) = user.refresh_token_mut(token) else {
            return Err(AppError::invalid_token("Refresh token not found"));
        };

        if current.is_revoked() {
            let revoked = self.revoke_descendants(&mut user, token, ip, now);
            warn!(
                user_id = %user_id,
                token = %token_fingerprint(token),
                ip = %ip,
                revoked_descendants = revoked,
                "Revoked refresh token presented, cascading revocation"
            );
            if revoked > 0 {
                self.users.replace_user(&mut user).await?;
            }
            return Err(AppError::invalid_token("Refresh token has been revoked"));
        }

        if current.is_expired_at(now) {
            warn!(
                user_id = %user_id,
                token = %token_fingerprint(token),
                "Expired refresh token presented"
            );
            return Err(AppError::invalid_token("Refresh token has expired"));
        }

        let fresh = self.rotate_at(current, ip, now);
        user.refresh_tokens.push(fresh.clone());
        let removed = self.cleanup_at(&mut user, now);
        self.users.replace_user(&mut user).await?;

        info!(
            user_id = %user.id,
            from = %token_fingerprint(token),
            to = %token_fingerprint(&fresh.token),
            cleaned_up = removed,
            "Refresh token rotated"
        );
        Ok((fresh, user))
    }

    /// Revoke `token` without issuing a successor.
    ///
    /// Fails `InvalidToken` when the token does not exist or is already
    /// inactive. `reason` defaults to [`REASON_REVOKED`].
    pub async fn revoke(&self, token: &str, ip: &str, reason: Option<&str>) -> AppResult<()> {
        let reason = reason.unwrap_or(REASON_REVOKED);
        self.retry
            .run("revoke_refresh_token", || self.try_revoke(token, ip, reason))
            .await
    }

    async fn try_revoke(&self, token: &str, ip: &str, reason: &str) -> AppResult<()> {
        let mut user = self
            .users
            .get_user_by_refresh_token(token)
            .await?
            .ok_or_else(|| AppError::invalid_token("Refresh token not found"))?;
        let now = self.clock.now();

        match user.refresh_token_mut(token) {
            Some(record) if record.is_active_at(now) => record.revoke(now, ip, reason),
            _ => return Err(AppError::invalid_token("Refresh token is not active")),
        }
        self.users.replace_user(&mut user).await?;

        info!(
            user_id = %user.id,
            token = %token_fingerprint(token),
            reason = %reason,
            "Refresh token revoked"
        );
        Ok(())
    }
}
