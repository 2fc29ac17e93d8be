use std::time::Duration;

use async_trait::async_trait;
use homealert_core::MailConfig;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::{authentication::Credentials, response::Response},
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use super::{AlertEmail, Mailer};
use crate::error::DeliveryError;

/// Implicit-TLS submission port; every other port negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

/// Delivers alerts through an SMTP relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    /// Right-hand side of generated `Message-ID` headers.
    message_id_domain: String,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Builds the relay transport from validated mail settings.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Config`] when no host is configured,
    /// [`DeliveryError::InvalidAddress`] for a malformed from address, or
    /// [`DeliveryError::Smtp`] if the TLS relay cannot be set up.
    pub fn from_config(config: &MailConfig) -> Result<Self, DeliveryError> {
        let host = config
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| DeliveryError::Config("SMTP host is not set".to_string()))?;

        let builder = if config.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };
        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.send_timeout_secs)));
        if let Some(auth) = &config.auth {
            builder = builder.credentials(Credentials::new(
                auth.username.clone(),
                auth.password.clone(),
            ));
        }

        let from_address = parse_address(&config.from_address)?;
        let message_id_domain = from_address.domain().to_string();

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some("HomeAlert".to_string()), from_address),
            message_id_domain,
        })
    }

    fn build_message(&self, email: &AlertEmail, message_id: &str) -> Result<Message, DeliveryError> {
        let to = Mailbox::new(Some(email.to.name.clone()), parse_address(&email.to.email)?);

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .message_id(Some(message_id.to_string()))
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &AlertEmail) -> Result<String, DeliveryError> {
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.message_id_domain);
        let message = self.build_message(email, &message_id)?;

        let response = self.transport.send(message).await?;
        check_response(&response)?;

        tracing::debug!(to = %email.to.email, message_id = %message_id, "alert email accepted by relay");
        Ok(message_id)
    }

    fn transport_name(&self) -> &'static str {
        "smtp"
    }
}

/// Turns a non-positive relay reply into [`DeliveryError::Rejected`].
fn check_response(response: &Response) -> Result<(), DeliveryError> {
    if response.is_positive() {
        return Ok(());
    }
    let detail = response.message().collect::<Vec<_>>().join(" ");
    Err(DeliveryError::Rejected(format!("{} {detail}", response.code())))
}

fn parse_address(raw: &str) -> Result<Address, DeliveryError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| DeliveryError::InvalidAddress {
            address: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::Recipient;
    use homealert_core::{MailTransport, SmtpAuth};
    use lettre::transport::smtp::response::{Category, Code, Detail, Severity};

    fn smtp_config() -> MailConfig {
        MailConfig {
            transport: MailTransport::Smtp,
            host: Some("smtp.example.com".to_string()),
            port: 587,
            auth: Some(SmtpAuth {
                username: "alerts".to_string(),
                password: "hunter2".to_string(),
            }),
            from_address: "alerts@homealert.co.ke".to_string(),
            frontend_base_url: "https://homealert.co.ke".to_string(),
            send_timeout_secs: 10,
        }
    }

    fn make_email(to: &str) -> AlertEmail {
        AlertEmail {
            to: Recipient {
                email: to.to_string(),
                name: "Kamau".to_string(),
            },
            subject: "New Properties Match Your Search: Karen houses".to_string(),
            text_body: "plain".to_string(),
            html_body: "<p>html</p>".to_string(),
            property_count: 1,
        }
    }

    #[tokio::test]
    async fn message_id_domain_comes_from_sender() {
        let mailer = SmtpMailer::from_config(&smtp_config()).expect("mailer");
        assert_eq!(mailer.message_id_domain, "homealert.co.ke");
    }

    #[tokio::test]
    async fn malformed_sender_is_rejected() {
        let config = MailConfig {
            from_address: "not-an-address".to_string(),
            ..smtp_config()
        };
        let err = SmtpMailer::from_config(&config).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn malformed_recipient_fails_before_connecting() {
        let mailer = SmtpMailer::from_config(&smtp_config()).expect("mailer");
        let err = mailer.send(&make_email("kamau-at-example")).await.unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn message_builds_with_both_parts() {
        let mailer = SmtpMailer::from_config(&smtp_config()).expect("mailer");
        let message = mailer
            .build_message(&make_email("kamau@example.com"), "<id@homealert.co.ke>")
            .expect("message");
        let raw = String::from_utf8(message.formatted()).expect("utf8");
        assert!(raw.contains("Subject: New Properties Match Your Search: Karen houses"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn negative_reply_becomes_rejection_with_code_and_text() {
        let response = Response::new(
            Code::new(
                Severity::PermanentNegativeCompletion,
                Category::MailSystem,
                Detail::Zero,
            ),
            vec!["mailbox".to_string(), "unavailable".to_string()],
        );

        let err = check_response(&response).unwrap_err();
        match err {
            DeliveryError::Rejected(text) => assert_eq!(text, "550 mailbox unavailable"),
            other => panic!("expected Rejected, got: {other:?}"),
        }
    }

    #[test]
    fn positive_reply_is_accepted() {
        let response = Response::new(
            Code::new(
                Severity::PositiveCompletion,
                Category::MailSystem,
                Detail::Zero,
            ),
            vec!["OK".to_string()],
        );
        assert!(check_response(&response).is_ok());
    }
}
