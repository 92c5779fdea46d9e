//! User domain entities.

pub mod capability;
pub mod model;

pub use capability::Capability;
pub use model::{User, UserSummary};
