//! Notification capability boundary.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Errors from the notification capability. Reported as a class distinct
/// from training failures; a delivery failure never retroactively fails an
/// already-succeeded training run.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// One message to an operator.
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// External delivery capability. The concrete transport (email, chat,
/// webhook) lives outside this system; the orchestrator only calls this.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &Notification) -> Result<(), NotifyError>;
}

/// Default capability: writes the notification to the structured log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &Notification) -> Result<(), NotifyError> {
        if message.recipient.trim().is_empty() {
            return Err(NotifyError::InvalidRecipient("empty recipient".to_string()));
        }
        info!(
            recipient = %message.recipient,
            subject = %message.subject,
            body = %message.body,
            "notification delivered"
        );
        Ok(())
    }
}
