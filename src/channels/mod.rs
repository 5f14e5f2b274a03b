//! Mail collaborators: outbound transport and inbound inbox.
//!
//! The pipeline only sees the [`MailTransport`] and [`Inbox`] traits so the
//! SMTP and MailHog implementations can be swapped for stubs.

pub mod email;
pub mod mailhog;

pub use email::SmtpMailer;
pub use mailhog::{InboxMessage, MailHogInbox, replies_addressed_to};

use async_trait::async_trait;

use crate::error::TransportError;

/// An outbound plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Explicit Message-ID (with angle brackets). Generated when `None`.
    pub message_id: Option<String>,
}

impl OutgoingEmail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            message_id: None,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }
}

/// Delivers email. Returns the Message-ID on success.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, TransportError>;
}

/// Lists every message currently in the campaign inbox, in inbox order.
#[async_trait]
pub trait Inbox: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<InboxMessage>, TransportError>;
}
