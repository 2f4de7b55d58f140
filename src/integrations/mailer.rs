use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EmailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email api rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Transactional email delivery. Returns the provider's message id.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<String, MailError>;
}

pub fn from_config(config: &EmailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match &config.api_key {
        Some(api_key) => Ok(Arc::new(HttpMailer::new(config, api_key.clone())?)),
        None => {
            tracing::warn!("EMAIL_API_KEY not set, notifications will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Client for a Resend-compatible `POST /emails` API.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &EmailConfig, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, MailError> {
        let body = SendEmailBody {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendEmailResponse = response.json().await?;
        tracing::info!(to = %message.to, id = %parsed.id, "email sent");
        Ok(parsed.id)
    }
}

/// Used when no email API key is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, MailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "email delivery disabled");
        Ok(format!("log-{}", uuid::Uuid::new_v4()))
    }
}
