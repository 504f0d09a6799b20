//! SMTP notifier using Lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::notifier::{Notification, Notifier};
use crate::error::{ProvisioningError, Result};

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP relay host, reached over STARTTLS.
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox, e.g. `"Shop <noreply@shop.test>"`.
    pub from: String,
}

/// Notifier delivering mail through an SMTP relay.
///
/// Permanent SMTP rejections (5xx) are reported as `Ok(false)`; connection
/// and temporary errors are transport faults.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Creates a notifier from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender address or relay host is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config.from.parse().map_err(|e| {
            ProvisioningError::NotificationTransport(format!("Invalid from address: {e}"))
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ProvisioningError::NotificationTransport(format!("SMTP relay error: {e}")))?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

/// Builds a multipart (plain text + HTML) message.
fn build_message(from: &Mailbox, to: Mailbox, notification: &Notification) -> Result<Message> {
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(notification.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            notification.text.clone(),
            notification.html.clone(),
        ))
        .map_err(|e| ProvisioningError::NotificationTransport(format!("Failed to build email: {e}")))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[tracing::instrument(skip(self, notification), fields(to = %notification.to))]
    async fn send(&self, notification: &Notification) -> Result<bool> {
        let to: Mailbox = match notification.to.parse() {
            Ok(to) => to,
            Err(e) => {
                tracing::warn!(error = %e, "Recipient address refused");
                return Ok(false);
            }
        };
        let message = build_message(&self.from, to, notification)?;

        match self.transport.send(message).await {
            Ok(response) => Ok(response.is_positive()),
            Err(e) if e.is_permanent() => {
                tracing::warn!(error = %e, "SMTP server rejected the message");
                Ok(false)
            }
            Err(e) => Err(ProvisioningError::NotificationTransport(format!(
                "Failed to send email: {e}"
            ))),
        }
    }
}
