use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailReceipt {
    pub message_id: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail rejected: {0}")]
    Rejected(String),
}

/// Outbound mail collaborator. Delivery itself lives outside this service;
/// callers only get the send capability.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str)
        -> Result<MailReceipt, MailError>;
}

/// Default collaborator: records the hand-off in the log and fabricates a
/// message id instead of talking to a transport.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<MailReceipt, MailError> {
        let message_id = Uuid::new_v4().to_string();
        tracing::info!(to, subject, bytes = html_body.len(), %message_id, "mail handed off");
        Ok(MailReceipt { message_id })
    }
}
