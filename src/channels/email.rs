//! SMTP delivery via lettre.
//!
//! Anonymous plaintext relay when no credentials are configured (MailHog),
//! STARTTLS with login otherwise.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::channels::{MailTransport, OutgoingEmail};
use crate::config::SmtpConfig;
use crate::error::TransportError;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// SMTP transport for outreach and simulated replies.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Whether a login will be attempted.
    pub fn uses_auth(&self) -> bool {
        !self.config.username.is_empty() && !self.config.password.expose_secret().is_empty()
    }

    /// Build the RFC 5322 message.
    fn build_message(&self, email: &OutgoingEmail) -> Result<(Message, String), TransportError> {
        let from_address: Address =
            self.config
                .from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
                    address: self.config.from_address.clone(),
                    reason: e.to_string(),
                })?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| TransportError::InvalidAddress {
                address: email.to.clone(),
                reason: e.to_string(),
            })?;

        let message_id = email
            .message_id
            .clone()
            .unwrap_or_else(|| generate_message_id(from_address.domain()));

        let message = Message::builder()
            .from(Mailbox::new(Some(self.config.from_name.clone()), from_address))
            .to(to)
            .subject(&email.subject)
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok((message, message_id))
    }

    /// Blocking send. Run on a blocking thread.
    fn send_blocking(&self, message: &Message) -> Result<(), TransportError> {
        let transport = if self.uses_auth() {
            let creds = Credentials::new(
                self.config.username.clone(),
                self.config.password.expose_secret().to_string(),
            );
            SmtpTransport::starttls_relay(&self.config.host)
                .map_err(|e| TransportError::SendFailed(format!("SMTP relay error: {e}")))?
                .port(self.config.port)
                .credentials(creds)
                .timeout(Some(SMTP_TIMEOUT))
                .build()
        } else {
            SmtpTransport::builder_dangerous(&self.config.host)
                .port(self.config.port)
                .timeout(Some(SMTP_TIMEOUT))
                .build()
        };

        transport
            .send(message)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, TransportError> {
        let (message, message_id) = self.build_message(email)?;
        let mailer = self.clone();

        tokio::task::spawn_blocking(move || mailer.send_blocking(&message))
            .await
            .map_err(|e| TransportError::SendFailed(format!("SMTP task failed: {e}")))??;

        tracing::info!(to = %email.to, message_id = %message_id, "Email sent");
        Ok(message_id)
    }
}

/// `<uuid@domain>` style Message-ID.
pub fn generate_message_id(domain: &str) -> String {
    format!("<{}@{}>", Uuid::new_v4().simple(), domain)
}
