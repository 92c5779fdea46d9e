//! Organization invitation configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound for the acceptance and removal windows.
pub const MAX_INVITATION_DAYS: i64 = 365;

/// Settings for invitation tokens and the link sent to the receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Prefix of the link delivered to the receiver; the token is appended after `/`.
    #[serde(default = "default_base_link")]
    pub base_link: String,
    /// Days until an invitation can no longer be accepted.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_days: i64,
    /// Days until an invitation is hard-deleted by a purge.
    #[serde(default = "default_removal")]
    pub removal_days: i64,
    /// Length of the generated alphanumeric token.
    #[serde(default = "default_token_length")]
    pub token_length: usize,
    /// How many times generation is retried when a token already exists.
    #[serde(default = "default_generation_attempts")]
    pub max_generation_attempts: u32,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            base_link: default_base_link(),
            token_ttl_days: default_token_ttl(),
            removal_days: default_removal(),
            token_length: default_token_length(),
            max_generation_attempts: default_generation_attempts(),
        }
    }
}

impl InvitationConfig {
    /// The removal deadline must not precede the acceptance deadline.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.token_ttl_days <= 0 || self.removal_days < self.token_ttl_days {
            return Err(AppError::configuration(
                "invitation.removal_days must be >= invitation.token_ttl_days > 0",
            ));
        }
        if self.removal_days > MAX_INVITATION_DAYS {
            return Err(AppError::configuration(format!(
                "invitation.removal_days must not exceed {MAX_INVITATION_DAYS}"
            )));
        }
        if self.token_length == 0 || self.max_generation_attempts == 0 {
            return Err(AppError::configuration(
                "invitation.token_length and invitation.max_generation_attempts must be positive",
            ));
        }
        Ok(())
    }
}

fn default_base_link() -> String {
    "http://localhost:3000/invitation".to_string()
}

fn default_token_ttl() -> i64 {
    2
}

fn default_removal() -> i64 {
    5
}

fn default_token_length() -> usize {
    8
}

fn default_generation_attempts() -> u32 {
    5
}
