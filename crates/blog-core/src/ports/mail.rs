//! Outbound mail port.

use async_trait::async_trait;
use serde::Serialize;

/// A fully composed message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Mail transport. Delivery is synchronous from the caller's point of view:
/// `send` resolves once the transport accepted or rejected the message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail transport unavailable: {0}")]
    Transport(String),

    #[error("Mail rejected: {0}")]
    Rejected(String),
}
