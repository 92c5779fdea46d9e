//! Refresh token records owned by a user.

pub mod model;

pub use model::RefreshToken;
