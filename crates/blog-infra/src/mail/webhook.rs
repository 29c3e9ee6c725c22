//! Webhook mail transport - hands messages to an HTTP mail relay.

use async_trait::async_trait;

use blog_core::ports::{MailError, Mailer, OutgoingMail};

/// Posts each message as JSON (`from`, `to`, `subject`, `body`) to a relay URL.
/// Any non-success status counts as a rejection. Nothing is retried.
pub struct WebhookMailer {
    url: String,
    client: reqwest::Client,
}

impl WebhookMailer {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.url)
            .json(mail)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "Mail relay rejected message");
            return Err(MailError::Rejected(format!("relay answered {status}")));
        }

        tracing::info!(subject = %mail.subject, "Mail handed to relay");
        Ok(())
    }
}
