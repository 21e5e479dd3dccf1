//! Notification delivery adapters.
//!
//! Notifications are stored by the database layer; delivering them to a
//! person is an outside capability behind [`NotificationSender`]. Two
//! adapters ship: [`EmailSender`] over SMTP (`lettre`) and [`LogSender`],
//! which only writes a tracing event and is used when SMTP is not configured.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::info;

use crate::config::SmtpConfig;

/// Delivery errors.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Failed to build the outgoing message.
    #[error("Failed to build message: {0}")]
    BuildError(String),
    /// Transport refused or failed to send.
    #[error("Failed to send message: {0}")]
    SendError(String),
    /// Invalid recipient or sender address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Recipient address.
    pub to_email: String,
    /// Recipient display name.
    pub to_name: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Capability to deliver a notification to a person.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Delivers one message.
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;

    /// Short name used in logs.
    fn channel(&self) -> &'static str;
}

/// Sender that records the notification in the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        info!(
            to = %message.to_email,
            subject = %message.subject,
            "Notification delivered to log channel"
        );
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "log"
    }
}

/// Sender that delivers notifications as plain-text email.
#[derive(Clone)]
pub struct EmailSender {
    config: SmtpConfig,
}

impl std::fmt::Debug for EmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSender")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("password", &"[hidden]")
            .finish()
    }
}

impl EmailSender {
    /// Creates a new email sender.
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
                .map_err(|e| DeliveryError::SendError(e.to_string()))?
                .port(self.config.port)
                .credentials(creds)
                .build(),
        )
    }

    /// Builds the MIME message without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error if an address does not parse.
    pub fn build_message(&self, message: &OutboundMessage) -> Result<Message, DeliveryError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);
        let to = format!("{} <{}>", message.to_name, message.to_email);

        Message::builder()
            .from(
                from.parse()
                    .map_err(|e| DeliveryError::InvalidAddress(format!("{e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| DeliveryError::InvalidAddress(format!("{e}")))?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| DeliveryError::BuildError(e.to_string()))
    }
}

#[async_trait]
impl NotificationSender for EmailSender {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let email = self.build_message(message)?;
        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::SendError(e.to_string()))?;
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: "user".to_string(),
            password: "pass".to_string(),
            from_email: "noreply@wayfare.test".to_string(),
            from_name: "Wayfare".to_string(),
        }
    }

    fn message(to: &str) -> OutboundMessage {
        OutboundMessage {
            to_email: to.to_string(),
            to_name: "Dana".to_string(),
            subject: "Approval required".to_string(),
            body: "TR-2026-00001 is waiting for you".to_string(),
        }
    }

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let sender = LogSender;
        assert!(sender.send(&message("dana@wayfare.test")).await.is_ok());
        assert_eq!(sender.channel(), "log");
    }

    #[test]
    fn test_email_sender_builds_message() {
        let sender = EmailSender::new(smtp());
        assert!(sender.build_message(&message("dana@wayfare.test")).is_ok());
        assert_eq!(sender.channel(), "email");
    }

    #[test]
    fn test_email_sender_rejects_bad_address() {
        let sender = EmailSender::new(smtp());
        let result = sender.build_message(&message("not an address"));
        assert!(matches!(result, Err(DeliveryError::InvalidAddress(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", EmailSender::new(smtp()));
        assert!(!rendered.contains("pass\""));
        assert!(rendered.contains("[hidden]"));
    }
}
