use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use tracing::info;

/// Used when no mail relay is configured; messages only reach the log.
pub struct LogEmailService;

#[async_trait]
impl EmailService for LogEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        info!(recipient = %recipient, subject = %subject, bytes = html_body.len(), "Email not delivered (no relay configured)");
        Ok(())
    }
}
