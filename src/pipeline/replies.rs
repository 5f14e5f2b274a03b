//! Demo reply simulator.
//!
//! Sends canned replies from "leads" back to the campaign address so the
//! matching and classification stages have something to work on in a local
//! MailHog setup.

use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{info, warn};
use uuid::Uuid;

use crate::channels::{MailTransport, OutgoingEmail};

/// Canned replies covering every rule plus one that needs the model.
pub const REPLY_TEMPLATES: [&str; 8] = [
    "Hi, I'm interested. Can we book a call next Tuesday?",
    "Out of office until next week. Please follow up later.",
    "Not interested at the moment, thanks.",
    "Please remove me from your mailing list and unsubscribe.",
    "Delivery failed: user mailbox full (bounce).",
    "Let's talk — Wednesday afternoon works.",
    "No thanks.",
    "Thanks, but we're covered. Try again next quarter.",
];

/// Default number of simulated replies.
pub const DEFAULT_SIMULATED_REPLIES: usize = 8;

/// A successfully delivered outreach email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub email: String,
    pub subject: String,
    pub message_id: String,
}

/// Pick up to `n` distinct templates in random order.
pub fn pick_replies<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<&'static str> {
    let mut chosen = REPLY_TEMPLATES.to_vec();
    chosen.shuffle(rng);
    chosen.truncate(n.min(REPLY_TEMPLATES.len()));
    chosen
}

/// Sends simulated replies through the regular transport.
pub struct ReplySimulator {
    transport: Arc<dyn MailTransport>,
    campaign_address: String,
    reply_domain: String,
}

impl ReplySimulator {
    pub fn new(transport: Arc<dyn MailTransport>, campaign_address: impl Into<String>) -> Self {
        let campaign_address = campaign_address.into();
        let reply_domain = campaign_address
            .rsplit_once('@')
            .map_or("acme.test", |(_, domain)| domain)
            .to_string();
        Self {
            transport,
            campaign_address,
            reply_domain,
        }
    }

    /// Send one reply per sent message, pairing them in order, until `replies` runs out.
    ///
    /// Returns how many replies were delivered. Send failures are logged and skipped.
    pub async fn simulate(&self, sent: &[SentMessage], replies: &[&str]) -> usize {
        let mut delivered = 0;
        for (original, reply) in sent.iter().zip(replies) {
            let email = OutgoingEmail::new(
                &self.campaign_address,
                format!("Re: {}", original.subject),
                *reply,
            )
            .with_message_id(format!("<reply-{}@{}>", Uuid::new_v4(), self.reply_domain));

            match self.transport.send(&email).await {
                Ok(_) => delivered += 1,
                Err(e) => warn!(lead = %original.email, error = %e, "Simulated reply send failed"),
            }
        }
        info!(delivered, "Simulated replies sent");
        delivered
    }
}
