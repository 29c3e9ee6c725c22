//! Log mail transport - writes messages to the tracing log instead of sending them.

use async_trait::async_trait;

use blog_core::ports::{MailError, Mailer, OutgoingMail};

use crate::pii::mask_email;

/// Development mailer: every message is "delivered" to the log.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if mail.to.is_empty() {
            return Err(MailError::Rejected("no recipients".to_string()));
        }

        let recipients: Vec<String> = mail.to.iter().map(|r| mask_email(r)).collect();
        tracing::info!(
            subject = %mail.subject,
            from = %mail.from,
            to = ?recipients,
            "Mail delivered to log"
        );
        tracing::debug!(body = %mail.body, "Mail body");
        Ok(())
    }
}
