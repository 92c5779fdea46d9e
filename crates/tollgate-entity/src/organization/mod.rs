//! Organization aggregate.

pub mod model;

pub use model::{Organization, OrganizationMember};
