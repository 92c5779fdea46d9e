//! SMTP delivery via lettre.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use tollgate_core::config::NotificationConfig;
use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_core::traits::Notifier;

/// Sends plain-text mail through an SMTP relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("host", &self.host)
            .field("from", &self.from.to_string())
            .finish()
    }
}

impl SmtpNotifier {
    /// Build a relay transport from notification settings.
    pub fn new(config: &NotificationConfig) -> AppResult<Self> {
        let from: Mailbox = config.from_address.parse().map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid sender address '{}'", config.from_address),
                e,
            )
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid SMTP relay '{}'", config.smtp_host),
                    e,
                )
            })?
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            "SMTP notifier initialized"
        );

        Ok(Self {
            mailer: builder.build(),
            from,
            host: config.smtp_host.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_message(&self, to_address: &str, subject: &str, body: &str) -> AppResult<()> {
        let to: Mailbox = to_address.parse().map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                format!("Invalid recipient address '{to_address}'"),
                e,
            )
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to build message", e))?;

        match self.mailer.send(message).await {
            Ok(_) => {
                info!(to = %to_address, subject = %subject, "Message sent");
                Ok(())
            }
            Err(e) => {
                error!(to = %to_address, error = %e, "Failed to send message");
                Err(AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("SMTP delivery to {to_address} failed"),
                    e,
                ))
            }
        }
    }
}
