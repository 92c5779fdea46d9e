//! # tollgate-entity
//!
//! Domain aggregates owned by the credential core: users with their
//! refresh-token collection, organizations, and invitation tokens.

pub mod invitation;
pub mod organization;
pub mod refresh_token;
pub mod user;

pub use invitation::{InvitationStatus, InvitationToken};
pub use organization::{Organization, OrganizationMember};
pub use refresh_token::RefreshToken;
pub use user::{Capability, User, UserSummary};

/// Short, log-safe prefix of a bearer token.
pub fn token_fingerprint(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(6)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
