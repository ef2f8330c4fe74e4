//! SMTP delivery via lettre.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::info;

use async_trait::async_trait;
use taskhive_core::{AppError, Config};

use super::{MailMessage, Mailer};

const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpMailer {
    /// Create the SMTP mailer from config. Returns `None` if SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let host = config.smtp_host()?;
        let from = config.smtp_from()?.to_string();
        let port = config.smtp_port().unwrap_or(DEFAULT_SMTP_PORT);
        let credentials = match (config.smtp_user(), config.smtp_password()) {
            (Some(u), Some(p)) => Some(Credentials::new(u.to_string(), p.to_string())),
            _ => None,
        };

        let mailer = if config.smtp_tls() {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| tracing::error!(host = %host, error = %e, "Invalid SMTP relay"))
                .ok()?
                .port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            info!(host = %host, port = port, "Mailer initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            info!(host = %host, port = port, "Mailer initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip(self, message), fields(mail.to = %message.to))]
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::EmailDelivery(format!("Invalid recipient address: {}", e)))?;
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| AppError::EmailDelivery(format!("Invalid SMTP_FROM: {}", e)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| AppError::EmailDelivery(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| AppError::EmailDelivery(e.to_string()))?;
        info!(subject = %message.subject, "Email sent");
        Ok(())
    }
}
