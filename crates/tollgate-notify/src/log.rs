//! Notifier that only emits a tracing event.

use async_trait::async_trait;
use tracing::info;

use tollgate_core::result::AppResult;
use tollgate_core::traits::Notifier;

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_message(&self, to_address: &str, subject: &str, body: &str) -> AppResult<()> {
        info!(
            to = %to_address,
            subject = %subject,
            body_len = body.len(),
            "Message delivery skipped (log notifier)"
        );
        Ok(())
    }
}
