//! Refresh-token chains.

pub mod chain;

pub use chain::{REASON_REPLACED, REASON_REVOKED, RefreshTokenChain};
