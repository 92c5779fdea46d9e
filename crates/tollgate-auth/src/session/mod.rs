//! Login, refresh, logout, and registration flows.

pub mod manager;

pub use manager::{AuthResponse, SessionManager};
