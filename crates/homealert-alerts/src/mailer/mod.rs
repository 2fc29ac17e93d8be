//! The mail capability used by the dispatcher.
//!
//! Which implementation runs is decided once at startup by [`build_mailer`]:
//! [`SmtpMailer`] delivers through an SMTP relay, [`LogMailer`] only logs the
//! alert and is what development environments use.

mod log;
mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use homealert_core::{MailConfig, MailTransport};

use crate::error::DeliveryError;

pub use self::log::LogMailer;
pub use self::smtp::SmtpMailer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// A fully rendered alert, ready to hand to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEmail {
    pub to: Recipient,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    /// Number of listings in the body.
    pub property_count: usize,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `email` and returns the message id assigned to it.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the message cannot be built or the
    /// transport does not accept it.
    async fn send(&self, email: &AlertEmail) -> Result<String, DeliveryError>;

    /// Short name used in logs, e.g. `"smtp"`.
    fn transport_name(&self) -> &'static str;
}

/// Builds the mailer selected by `config.transport`.
///
/// # Errors
///
/// Returns [`DeliveryError::Config`] if SMTP is selected without a host, or
/// [`DeliveryError::Smtp`] if the relay cannot be set up.
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, DeliveryError> {
    match config.transport {
        MailTransport::Log => Ok(Arc::new(LogMailer::new())),
        MailTransport::Smtp => Ok(Arc::new(SmtpMailer::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_config() -> MailConfig {
        MailConfig {
            transport: MailTransport::Log,
            host: None,
            port: 587,
            auth: None,
            from_address: "noreply@homealert.local".to_string(),
            frontend_base_url: "http://localhost:5173".to_string(),
            send_timeout_secs: 30,
        }
    }

    #[test]
    fn log_transport_builds_log_mailer() {
        let mailer = build_mailer(&log_config()).expect("log mailer");
        assert_eq!(mailer.transport_name(), "log");
    }

    #[test]
    fn smtp_transport_without_host_is_rejected() {
        let config = MailConfig {
            transport: MailTransport::Smtp,
            ..log_config()
        };
        let err = build_mailer(&config).err().expect("must fail");
        assert!(matches!(err, DeliveryError::Config(_)), "got: {err:?}");
    }
}
