/// Email delivery for activation codes
use crate::config::EmailSettings;
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Out-of-band delivery to the user. Synchronous, no retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, body: &str, to: &str, subject: &str) -> Result<(), MailError>;
}

/// Async email transport wrapper (SMTP or no-op)
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl EmailService {
    /// Build email service from configuration
    ///
    /// If SMTP host is empty, operates in no-op mode (logs only).
    pub fn new(config: &EmailSettings) -> Result<Self, MailError> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress {
                address: config.smtp_from.clone(),
                reason: e.to_string(),
            })?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| MailError::Transport(format!("failed to configure SMTP transport: {e}")))?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    /// Check if SMTP transport is enabled
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(&self, body: &str, to: &str, subject: &str) -> Result<(), MailError> {
        let recipient = to.parse::<Mailbox>().map_err(|e| MailError::InvalidAddress {
            address: to.to_string(),
            reason: e.to_string(),
        })?;

        let Some(transport) = &self.transport else {
            info!(subject, "Email service running in no-op mode; skipping actual send");
            return Ok(());
        };

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        info!(subject, "email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(host: &str) -> EmailSettings {
        EmailSettings {
            smtp_host: host.to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@ceramicraft.dev".to_string(),
            use_starttls: true,
        }
    }

    #[tokio::test]
    async fn test_noop_mode_accepts_valid_recipient() {
        let service = EmailService::new(&settings("")).unwrap();
        assert!(!service.is_enabled());

        service
            .send("Your activation code is: 123456", "a@x.com", "Activate your account")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let service = EmailService::new(&settings("")).unwrap();
        let err = service.send("body", "not an address", "subject").await.unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress { .. }));
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let mut config = settings("");
        config.smtp_from = "broken".to_string();
        assert!(EmailService::new(&config).is_err());
    }
}
