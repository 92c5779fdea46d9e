//! # tollgate-core
//!
//! Core crate for Tollgate. Contains the unified error system, configuration
//! schemas, typed identifiers, the clock seam, the notification contract,
//! and the bounded retry runner used around read-modify-write cycles.
//!
//! This crate has **no** internal dependencies on other Tollgate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
pub use retry::RetryPolicy;
