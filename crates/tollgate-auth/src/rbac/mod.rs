//! Capability-based access checks.

pub mod guard;

pub use guard::{authorize, require_any};
