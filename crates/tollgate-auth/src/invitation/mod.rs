//! Organization invitations.

pub mod manager;

pub use manager::{InvitationLink, InvitationTokenManager, generate_token};
