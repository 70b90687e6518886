//! Transactional email relay.

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::EmailConfig;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailReceipt {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email provider is not configured")]
    NotConfigured,

    #[error("email provider rejected the message ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("email provider unreachable: {0}")]
    Transport(String),
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::NotConfigured => {
                AppError::Internal("email provider is not configured".to_string())
            }
            EmailError::Provider { status, message } => AppError::Upstream { status, message },
            EmailError::Transport(message) => AppError::Upstream {
                status: 502,
                message,
            },
        }
    }
}

pub trait EmailSender: Send + Sync {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<EmailReceipt, EmailError>>;
}

impl EmailMessage {
    pub fn validate(&self) -> Result<(), AppError> {
        let blank = |field: &str| field.trim().is_empty();
        if blank(&self.to) || blank(&self.subject) || blank(&self.html) {
            return Err(AppError::BadRequest("to, subject and html are required".to_string()));
        }
        if !self.to.contains('@') {
            return Err(AppError::BadRequest("to must be an email address".to_string()));
        }
        Ok(())
    }
}

/// Sends through a Resend-compatible HTTP API.
pub struct HttpEmailSender {
    client: Client,
    config: EmailConfig,
}

impl HttpEmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[derive(Serialize)]
struct ProviderRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
}

impl EmailSender for HttpEmailSender {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<EmailReceipt, EmailError>> {
        Box::pin(async move {
            let api_key = self.config.api_key.as_deref().ok_or(EmailError::NotConfigured)?;

            let body = ProviderRequest {
                from: &self.config.from,
                to: vec![message.to.as_str()],
                subject: &message.subject,
                html: &message.html,
            };

            let response = self
                .client
                .post(&self.config.api_url)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
                .map_err(|err| EmailError::Transport(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let message = response
                    .json::<ProviderError>()
                    .await
                    .ok()
                    .and_then(|body| body.message)
                    .unwrap_or_else(|| format!("provider returned {status}"));
                warn!(
                    status = status.as_u16(),
                    error = %message,
                    "email provider rejected message"
                );
                return Err(EmailError::Provider {
                    status: status.as_u16(),
                    message,
                });
            }

            response
                .json::<EmailReceipt>()
                .await
                .map_err(|err| EmailError::Transport(format!("invalid provider response: {err}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Your ride receipt".to_string(),
            html: "<p>Thanks for riding</p>".to_string(),
        }
    }

    #[test]
    fn complete_message_is_valid() {
        assert!(message("rider@example.com").validate().is_ok());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut empty_subject = message("rider@example.com");
        empty_subject.subject = " ".to_string();
        assert!(empty_subject.validate().is_err());
        assert!(message("not-an-address").validate().is_err());
    }

    #[tokio::test]
    async fn unconfigured_sender_refuses_to_send() {
        let sender = HttpEmailSender::new(EmailConfig::default());
        let result = sender.send(message("rider@example.com")).await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }
}
