//! Outbound email
//!
//! The board sends a handful of transactional messages: submission notices,
//! payment receipts and quick-apply confirmations. Delivery goes through the [`Mailer`] seam so the
//! core never depends on a particular provider.

pub mod log_mailer;

use async_trait::async_trait;
use thiserror::Error;

pub use log_mailer::LogMailer;

/// File attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl Email {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_attachments() {
        let email = Email::new("a@x.example", "b@y.example", "Hi", "Body").with_attachment(
            Attachment {
                filename: "cv.pdf".into(),
                content_type: "application/pdf".into(),
                data: vec![1, 2, 3],
            },
        );
        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.to, "b@y.example");
    }
}
