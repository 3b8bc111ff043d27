use crate::config::SmtpConfig;
use crate::spreadsheet::XLSX_MIME;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// A spreadsheet attached to an outgoing mail.
#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub attachment: Option<MailAttachment>,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body_text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body_text: body_text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, filename: impl Into<String>, content: Vec<u8>) -> Self {
        self.attachment = Some(MailAttachment {
            filename: filename.into(),
            content,
        });
        self
    }
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver the message, returning the relay's message id when it gives one.
    async fn send(&self, email: &EmailMessage) -> Result<Option<String>, MailError>;
    async fn health_check(&self) -> Result<(), MailError>;
    fn is_enabled(&self) -> bool;
}

pub struct SmtpMailer {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Configuration(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    fn build_message(&self, email: &EmailMessage) -> Result<Message, MailError> {
        let from_mailbox: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| MailError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| MailError::InvalidRecipient(format!("{}: {}", email.to, e)))?;

        let builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject);

        let text = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(email.body_text.clone());

        let message = match &email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(XLSX_MIME)
                    .map_err(|e| MailError::Configuration(format!("Invalid content type: {}", e)))?;
                builder.multipart(
                    MultiPart::mixed().singlepart(text).singlepart(
                        Attachment::new(attachment.filename.clone())
                            .body(attachment.content.clone(), content_type),
                    ),
                )
            }
            None => builder.singlepart(text),
        };

        message.map_err(|e| MailError::SendFailed(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl EmailProvider for SmtpMailer {
    async fn send(&self, email: &EmailMessage) -> Result<Option<String>, MailError> {
        let transport = match (&self.transport, self.config.enabled) {
            (Some(transport), true) => transport,
            (_, false) => {
                return Err(MailError::NotEnabled(
                    "SMTP email provider is not enabled".to_string(),
                ))
            }
            (None, true) => {
                return Err(MailError::Configuration(
                    "SMTP transport not initialized".to_string(),
                ))
            }
        };

        let message = self.build_message(email)?;

        let response = transport
            .send(message)
            .await
            .map_err(|e| MailError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            attachment = email.attachment.as_ref().map(|a| a.filename.as_str()),
            "Email sent successfully"
        );

        let message_id = response.message().next().map(|s| s.to_string());
        Ok(message_id)
    }

    async fn health_check(&self) -> Result<(), MailError> {
        let Some(transport) = self.transport.as_ref() else {
            return Ok(());
        };

        transport
            .test_connection()
            .await
            .map_err(|e| MailError::Connection(format!("SMTP connection test failed: {}", e)))?;

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Mail provider that logs instead of sending. Only a `recording` mock keeps
/// the messages it was given.
pub struct MockEmailProvider {
    enabled: bool,
    record: bool,
    send_count: AtomicU64,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    /// Counts and logs sends. A disabled provider fails every send, which
    /// exercises delivery errors.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            record: false,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Enabled provider that also keeps a copy of every message, attachments
    /// included, for inspection through `sent`.
    pub fn recording() -> Self {
        Self {
            record: true,
            ..Self::new(true)
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<Option<String>, MailError> {
        if !self.enabled {
            return Err(MailError::NotEnabled(
                "Mock email provider is not enabled".to_string(),
            ));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.record {
            self.sent
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(email.clone());
        }

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "[MOCK] Email would be sent"
        );

        Ok(Some(format!("mock-email-{}", count)))
    }

    async fn health_check(&self) -> Result<(), MailError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileConfig;
    use std::path::PathBuf;

    fn smtp_config() -> SmtpConfig {
        ReconcileConfig::for_memory(PathBuf::from("public")).smtp
    }

    #[tokio::test]
    async fn disabled_smtp_refuses_to_send() {
        let mailer = SmtpMailer::new(smtp_config()).unwrap();
        let result = mailer
            .send(&EmailMessage::new("ops@example.com", "Hi", "body"))
            .await;

        assert!(matches!(result, Err(MailError::NotEnabled(_))));
        assert!(!mailer.is_enabled());
    }

    #[test]
    fn messages_with_attachments_build_as_multipart() {
        let mailer = SmtpMailer::new(smtp_config()).unwrap();
        let email = EmailMessage::new("ops@example.com", "Report", "See attached.")
            .with_attachment("Reconciliation-Report.xlsx", b"PK\x03\x04".to_vec());

        let message = mailer.build_message(&email).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("Reconciliation-Report.xlsx"));
        assert!(raw.contains(XLSX_MIME));
    }

    #[test]
    fn invalid_recipient_is_reported() {
        let mailer = SmtpMailer::new(smtp_config()).unwrap();
        let err = mailer
            .build_message(&EmailMessage::new("not an address", "Hi", "body"))
            .unwrap_err();

        assert!(matches!(err, MailError::InvalidRecipient(_)));
    }

    #[tokio::test]
    async fn recording_mock_keeps_every_message() {
        let mock = MockEmailProvider::recording();
        mock.send(&EmailMessage::new("a@example.com", "One", "1"))
            .await
            .unwrap();
        mock.send(&EmailMessage::new("b@example.com", "Two", "2"))
            .await
            .unwrap();

        assert_eq!(mock.send_count(), 2);
        let subjects: Vec<String> = mock.sent().into_iter().map(|m| m.subject).collect();
        assert_eq!(subjects, vec!["One".to_string(), "Two".to_string()]);
    }

    #[tokio::test]
    async fn plain_mock_counts_without_keeping_messages() {
        let mock = MockEmailProvider::new(true);
        let email = EmailMessage::new("a@example.com", "Report", "See attached.")
            .with_attachment("Invoice-File.xlsx", vec![0u8; 4096]);

        for _ in 0..3 {
            mock.send(&email).await.unwrap();
        }

        assert_eq!(mock.send_count(), 3);
        assert!(mock.sent().is_empty());
    }

    #[tokio::test]
    async fn disabled_mock_fails_sends() {
        let mock = MockEmailProvider::new(false);
        assert!(mock
            .send(&EmailMessage::new("a@example.com", "One", "1"))
            .await
            .is_err());
        assert_eq!(mock.send_count(), 0);
    }
}
