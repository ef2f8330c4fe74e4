//! Outbound mail behind the [`Mailer`] trait.
//!
//! SMTP delivery lives in [`SmtpMailer`]; when no SMTP host is configured the
//! [`LogMailer`] records messages in the log instead, which keeps local setups
//! working without a mail server.

#[cfg(feature = "smtp")]
mod smtp;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use taskhive_core::{AppError, Config};

#[cfg(feature = "smtp")]
pub use smtp::SmtpMailer;

/// A single plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message. Failures surface as [`AppError::EmailDelivery`].
    async fn send(&self, message: &MailMessage) -> Result<(), AppError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "SMTP not configured, message logged instead of sent"
        );
        tracing::debug!(body = %message.body, "Undelivered message body");
        Ok(())
    }
}

/// Pick the mailer for this deployment: SMTP when configured, the log mailer otherwise.
pub fn mailer_from_config(config: &Config) -> Arc<dyn Mailer> {
    if let Some(mailer) = smtp_mailer(config) {
        return mailer;
    }

    if config.smtp_host().is_some() {
        tracing::warn!("SMTP_HOST is set but the SMTP transport could not be built, falling back to log mailer");
    } else {
        tracing::info!("Mail delivery disabled (SMTP_HOST not set), using log mailer");
    }
    Arc::new(LogMailer)
}

#[cfg(feature = "smtp")]
fn smtp_mailer(config: &Config) -> Option<Arc<dyn Mailer>> {
    SmtpMailer::from_config(config).map(|m| Arc::new(m) as Arc<dyn Mailer>)
}

#[cfg(not(feature = "smtp"))]
fn smtp_mailer(_config: &Config) -> Option<Arc<dyn Mailer>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let message = MailMessage {
            to: "lead@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "Body".to_string(),
        };
        assert!(LogMailer.send(&message).await.is_ok());
    }
}
