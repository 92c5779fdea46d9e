//! Outbound message delivery contract.

use async_trait::async_trait;

use crate::result::AppResult;

/// Delivers a plain-text message to an address.
///
/// Implementations map delivery failures to `ErrorKind::ExternalService`
/// so callers may retry them.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    /// Send `body` with `subject` to `to_address`.
    async fn send_message(&self, to_address: &str, subject: &str, body: &str) -> AppResult<()>;
}
