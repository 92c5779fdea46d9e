//! # tollgate-auth
//!
//! Credential and token management for Tollgate.
//!
//! ## Modules
//!
//! - `password`: credential digests (SHA-256 or Argon2id) and verification
//! - `jwt`: signed short-lived access tokens
//! - `refresh`: refresh-token rotation, replay detection, and cleanup
//! - `invitation`: single-use organization invitation tokens
//! - `session`: login, refresh, logout, and registration flows
//! - `rbac`: capability guard

pub mod invitation;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod refresh;
pub mod session;

pub use invitation::{InvitationLink, InvitationTokenManager};
pub use jwt::{AccessClaims, AccessIdentity, AccessTokenIssuer};
pub use password::CredentialHasher;
pub use rbac::{authorize, require_any};
pub use refresh::RefreshTokenChain;
pub use session::{AuthResponse, SessionManager};
