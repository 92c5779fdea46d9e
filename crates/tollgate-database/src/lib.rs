//! # tollgate-database
//!
//! Persistence contracts consumed by the credential core, their PostgreSQL
//! implementations (aggregates stored as JSONB documents with a version
//! column), and an in-memory implementation with the same semantics.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use repositories::{
    InvitationRepository, InvitationStore, OrganizationRepository, OrganizationStore,
    UserRepository, UserStore,
};
