//! Mailer and insight provider doubles.

use async_trait::async_trait;
use std::sync::Mutex;
use taskhive_core::AppError;
use taskhive_services::{InsightProvider, InsightRequest, MailMessage, Mailer};

/// Keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().expect("mailer lock").clone()
    }

    /// Reset token carried by the latest password reset mail to `to`
    pub fn last_reset_token(&self, to: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .filter(|m| m.to == to)
            .find_map(|m| {
                m.body
                    .split_once("token=")
                    .map(|(_, rest)| rest.split_whitespace().next().unwrap_or("").to_string())
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        self.sent.lock().expect("mailer lock").push(message.clone());
        Ok(())
    }
}

/// Rejects every message.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: &MailMessage) -> Result<(), AppError> {
        Err(AppError::EmailDelivery("connection refused".to_string()))
    }
}

/// Provider whose every call fails.
pub struct FailingProvider;

#[async_trait]
impl InsightProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &InsightRequest) -> anyhow::Result<String> {
        anyhow::bail!("provider unavailable")
    }
}
