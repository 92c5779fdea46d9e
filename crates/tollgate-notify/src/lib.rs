//! # tollgate-notify
//!
//! Implementations of the [`Notifier`] contract used to deliver invitation
//! links: a log-only notifier, an SMTP notifier, and an in-memory recorder.

pub mod log;
pub mod recording;
pub mod smtp;

use std::sync::Arc;

use tollgate_core::config::{NotificationConfig, NotificationProvider};
use tollgate_core::result::AppResult;
use tollgate_core::traits::Notifier;

pub use log::LogNotifier;
pub use recording::{RecordingNotifier, SentMessage};
pub use smtp::SmtpNotifier;

/// Build the notifier selected by `config.provider`.
pub fn build_notifier(config: &NotificationConfig) -> AppResult<Arc<dyn Notifier>> {
    match config.provider {
        NotificationProvider::Log => Ok(Arc::new(LogNotifier::new())),
        NotificationProvider::Smtp => Ok(Arc::new(SmtpNotifier::new(config)?)),
    }
}
