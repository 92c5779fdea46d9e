//! Signed access tokens.

pub mod claims;
pub mod issuer;

pub use claims::{AccessClaims, AccessIdentity};
pub use issuer::AccessTokenIssuer;
