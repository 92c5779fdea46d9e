//! Session lifecycle: login, refresh, logout and registration.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use tollgate_core::RetryPolicy;
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::Clock;
use tollgate_database::UserStore;
use tollgate_entity::{Capability, User, UserSummary, token_fingerprint};

use crate::invitation::InvitationTokenManager;
use crate::jwt::AccessTokenIssuer;
use crate::password::CredentialHasher;
use crate::refresh::RefreshTokenChain;

/// Tokens handed to a client after login or refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Signed access token.
    pub access_token: String,
    /// When the access token expires.
    pub access_expires_at: DateTime<Utc>,
    /// Opaque refresh token.
    pub refresh_token: String,
    /// When the refresh token expires.
    pub refresh_expires_at: DateTime<Utc>,
    /// The authenticated user.
    pub user: UserSummary,
}

/// Composes hashing, access tokens, and refresh chains into client flows.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    hasher: Arc<CredentialHasher>,
    issuer: Arc<AccessTokenIssuer>,
    chain: Arc<RefreshTokenChain>,
    invitations: Arc<InvitationTokenManager>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("hasher", &self.hasher)
            .field("issuer", &self.issuer)
            .field("chain", &self.chain)
            .finish()
    }
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<CredentialHasher>,
        issuer: Arc<AccessTokenIssuer>,
        chain: Arc<RefreshTokenChain>,
        invitations: Arc<InvitationTokenManager>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            users,
            hasher,
            issuer,
            chain,
            invitations,
            clock,
            retry,
        }
    }

    /// Authenticate `email` and start a new refresh chain for `ip`.
    ///
    /// Fails `UserNotFound` for an unknown email and `InvalidCredentials`
    /// when the password does not match the stored digest.
    pub async fn login(&self, email: &str, password: &str, ip: IpAddr) -> AppResult<AuthResponse> {
        let ip = ip.to_string();
        self.retry
            .run("login", || self.try_login(email, password, &ip))
            .await
    }

    async fn try_login(&self, email: &str, password: &str, ip: &str) -> AppResult<AuthResponse> {
        let mut user = self
            .users
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::user_not_found(format!("No user with email '{email}'")))?;

        if !self.hasher.matches(password, &user.password_hash)? {
            warn!(user_id = %user.id, ip = %ip, "Login rejected: password mismatch");
            return Err(AppError::invalid_credentials("Invalid email or password"));
        }

        let (access_token, access_expires_at) =
            self.issuer.issue(user.id, &user.email, &user.capabilities)?;

        let refresh = self.chain.generate(ip);
        user.refresh_tokens.push(refresh.clone());
        self.chain.cleanup(&mut user);
        self.users.replace_user(&mut user).await?;

        info!(
            user_id = %user.id,
            ip = %ip,
            refresh_token = %token_fingerprint(&refresh.token),
            "Login successful"
        );

        Ok(AuthResponse {
            access_token,
            access_expires_at,
            refresh_token: refresh.token,
            refresh_expires_at: refresh.expires_at,
            user: user.summary(),
        })
    }

    /// Rotate `token` and issue an access token from the current user state.
    pub async fn refresh(&self, token: &str, ip: IpAddr) -> AppResult<AuthResponse> {
        let (fresh, user) = self.chain.refresh(token, &ip.to_string()).await?;
        let (access_token, access_expires_at) =
            self.issuer.issue(user.id, &user.email, &user.capabilities)?;

        Ok(AuthResponse {
            access_token,
            access_expires_at,
            refresh_token: fresh.token,
            refresh_expires_at: fresh.expires_at,
            user: user.summary(),
        })
    }

    /// End the session identified by `token`.
    pub async fn logout(&self, token: &str, ip: IpAddr) -> AppResult<()> {
        self.chain.revoke(token, &ip.to_string(), None).await
    }

    /// Create a user. A duplicate email fails `Conflict`.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        capabilities: BTreeSet<Capability>,
    ) -> AppResult<UserSummary> {
        let mut user = self.new_user(email, password, capabilities)?;
        self.users.insert_user(&mut user).await?;

        info!(user_id = %user.id, email = %user.email, "User registered");
        Ok(user.summary())
    }

    /// Consume an invitation and register its receiver with the granted
    /// capabilities.
    ///
    /// The invitation is only spent once the user can be created: an
    /// existing account fails `Conflict` before acceptance, and a failed
    /// insert returns the invitation to the pending state.
    pub async fn register_invited(&self, token: &str, password: &str) -> AppResult<UserSummary> {
        let pending = self.invitations.check(token).await?;
        let email = pending.receiver_email.as_str();
        let existing = self
            .retry
            .run("get_user_by_email", || self.users.get_user_by_email(email))
            .await?;
        if existing.is_some() {
            return Err(AppError::conflict(format!(
                "A user with email '{email}' already exists"
            )));
        }
        let mut user = self.new_user(email, password, pending.capabilities.clone())?;

        let invitation = self.invitations.accept(token).await?;
        if let Err(err) = self.users.insert_user(&mut user).await {
            warn!(
                organization_id = %invitation.organization_id,
                error = %err,
                "Registration failed after accepting invitation, releasing it"
            );
            if let Err(release_err) = self.invitations.release(&invitation).await {
                error!(
                    organization_id = %invitation.organization_id,
                    error = %release_err,
                    "Failed to release invitation"
                );
            }
            return Err(err);
        }

        info!(
            user_id = %user.id,
            organization_id = %invitation.organization_id,
            "Invited user registered"
        );
        Ok(user.summary())
    }

    fn new_user(
        &self,
        email: &str,
        password: &str,
        capabilities: BTreeSet<Capability>,
    ) -> AppResult<User> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation(format!("'{email}' is not an email address")));
        }
        let digest = self.hasher.hash(password)?;
        Ok(User::new(email, digest, capabilities, self.clock.now()))
    }
}
