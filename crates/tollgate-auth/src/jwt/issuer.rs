//! Access-token signing and verification (HMAC-SHA256).

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use tollgate_core::config::AuthConfig;
use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::traits::Clock;
use tollgate_core::types::UserId;
use tollgate_entity::Capability;

use super::claims::{AccessClaims, AccessIdentity};

/// Mints and verifies short-lived access tokens.
///
/// Expiry is checked against the injected [`Clock`] with zero leeway.
#[derive(Clone)]
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AccessTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenIssuer")
            .field("lifetime", &self.lifetime)
            .field("clock", &self.clock)
            .finish()
    }
}

impl AccessTokenIssuer {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        // Expiry is compared against the injected clock instead.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            lifetime: Duration::minutes(config.access_token_ttl_minutes),
            clock,
        }
    }

    /// Sign a token for `user_id` carrying one role claim per capability.
    pub fn issue(
        &self,
        user_id: UserId,
        email: &str,
        capabilities: &BTreeSet<Capability>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let now = self.clock.now();
        let expires_at = now + self.lifetime;
        let claims = AccessClaims {
            sub: user_id,
            email: email.to_string(),
            role: capabilities.iter().copied().collect(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to sign access token", e)
            })?;

        debug!(user_id = %user_id, expires_at = %expires_at, "Access token issued");
        Ok((token, expires_at))
    }

    /// Decode and fully check `token`, reporting why it was rejected.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, AppError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::invalid_token("Invalid token signature")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::invalid_token("Invalid token format")
                }
                _ => AppError::invalid_token(format!("Token validation failed: {e}")),
            },
        )?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(AppError::invalid_token("Token has expired"));
        }
        Ok(data.claims)
    }

    /// The identity in `token`, or `None` if it is malformed, forged, or expired.
    pub fn validate(&self, token: &str) -> Option<AccessIdentity> {
        match self.decode(token) {
            Ok(claims) => Some(claims.into()),
            Err(e) => {
                debug!(error = %e, "Access token rejected");
                None
            }
        }
    }
}
