//! Mailer that records messages as structured log events instead of
//! delivering them.

use async_trait::async_trait;
use tracing::info;

use super::{Email, MailError, Mailer};
use crate::lifecycle::is_email;

#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if !is_email(&email.to) {
            return Err(MailError::InvalidRecipient(email.to));
        }
        info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body_len = email.body.len(),
            attachments = email.attachments.len(),
            "Email dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_invalid_recipient() {
        let mailer = LogMailer;
        assert!(
            mailer
                .send(Email::new("a@x.example", "nobody", "s", "b"))
                .await
                .is_err()
        );
        assert!(
            mailer
                .send(Email::new("a@x.example", "c@y.example", "s", "b"))
                .await
                .is_ok()
        );
    }
}
