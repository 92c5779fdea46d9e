//! Organization invitation tokens.

pub mod model;

pub use model::{InvitationStatus, InvitationToken};
