use async_trait::async_trait;
use chrono::Utc;

use super::{AlertEmail, Mailer};
use crate::error::DeliveryError;

/// Logs each alert instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl LogMailer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &AlertEmail) -> Result<String, DeliveryError> {
        let message_id = format!("dev-mode-{}", Utc::now().timestamp_millis());
        tracing::info!(
            to = %email.to.email,
            subject = %email.subject,
            properties = email.property_count,
            message_id = %message_id,
            "alert email (log transport, not sent)"
        );
        Ok(message_id)
    }

    fn transport_name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::Recipient;

    #[tokio::test]
    async fn log_mailer_returns_dev_mode_message_id() {
        let email = AlertEmail {
            to: Recipient {
                email: "amina@example.com".to_string(),
                name: "Amina".to_string(),
            },
            subject: "New Properties Match Your Search: Lavington".to_string(),
            text_body: String::new(),
            html_body: String::new(),
            property_count: 2,
        };

        let id = LogMailer::new().send(&email).await.expect("send");
        assert!(id.starts_with("dev-mode-"), "got: {id}");
    }
}
