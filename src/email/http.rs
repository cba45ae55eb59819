//! Transactional email API client

use crate::config::EmailConfig;
use crate::core::service::{EmailMessage, EmailSender};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct AttachmentPayload<'a> {
    filename: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    subject: &'a str,
    html: &'a str,
    attachments: Vec<AttachmentPayload<'a>>,
}

impl<'a> From<&'a EmailMessage> for EmailPayload<'a> {
    fn from(message: &'a EmailMessage) -> Self {
        Self {
            from: &message.from,
            to: &message.to,
            reply_to: message.reply_to.as_deref(),
            subject: &message.subject,
            html: &message.html,
            attachments: message
                .attachments
                .iter()
                .map(|a| AttachmentPayload {
                    filename: &a.filename,
                    content: &a.content,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct EmailAccepted {
    id: String,
}

/// Posts messages to a JSON email API with a bearer key
#[derive(Clone)]
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(anyhow!("email api key is not configured"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<String> {
        let payload = EmailPayload::from(&message);
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("email API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("email API returned {}: {}", status, body));
        }

        let accepted: EmailAccepted = response
            .json()
            .await
            .context("invalid email API response")?;
        Ok(accepted.id)
    }
}
