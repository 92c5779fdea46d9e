//! Notifier that keeps every message in memory.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::Notifier;

/// A message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to_address: String,
    pub subject: String,
    pub body: String,
}

/// Records messages instead of sending them. Clones share one outbox.
///
/// Can be switched into a failing mode to exercise delivery errors.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    outbox: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message sent so far, oldest first.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.outbox.lock().await.clone()
    }

    /// Make subsequent sends fail with `ExternalService`.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(&self, to_address: &str, subject: &str, body: &str) -> AppResult<()> {
        if *self.failing.lock().await {
            return Err(AppError::external_service(format!(
                "Delivery to {to_address} refused"
            )));
        }
        self.outbox.lock().await.push(SentMessage {
            to_address: to_address.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
