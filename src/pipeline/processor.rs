//! Campaign pipeline: per-lead outreach, then reply matching.
//!
//! Flow:
//! 1. For each lead in input order: enrich → compose → deliver → record
//! 2. Optionally send simulated replies (demo mode)
//! 3. Fetch the inbox, keep messages addressed to the campaign
//! 4. Pair replies with records by position and classify them
//! 5. Sort by category label, then priority descending
//!
//! Per-lead failures never abort the run: they become default values or a
//! `SendError: ...` status on the record.

use std::sync::Arc;

use tracing::{info, warn};

use crate::channels::{Inbox, MailTransport, OutgoingEmail, replies_addressed_to};
use crate::config::CampaignConfig;
use crate::error::ComposeError;
use crate::llm::LlmProvider;
use crate::pipeline::classifier::ReplyClassifier;
use crate::pipeline::composer::MessageComposer;
use crate::pipeline::enricher::LeadEnricher;
use crate::pipeline::replies::{DEFAULT_SIMULATED_REPLIES, ReplySimulator, SentMessage, pick_replies};
use crate::pipeline::rules::ReplyRules;
use crate::pipeline::types::{DeliveryStatus, Lead, OutreachRecord, ReplyRecord};

/// Stored reply text is cut to this many characters.
pub const MAX_RESPONSE_CHARS: usize = 240;

/// Recipient used when a lead has no `email` column at all.
const MISSING_EMAIL_RECIPIENT: &str = "test@example.com";

/// Outcome of processing one lead.
#[derive(Debug, Clone)]
pub struct LeadOutcome {
    pub record: OutreachRecord,
    /// Present only when delivery succeeded.
    pub sent: Option<SentMessage>,
}

/// Orchestrates a whole campaign run.
pub struct CampaignPipeline {
    enricher: LeadEnricher,
    composer: MessageComposer,
    classifier: ReplyClassifier,
    transport: Arc<dyn MailTransport>,
    inbox: Arc<dyn Inbox>,
    campaign_address: String,
    generate_fake_replies: bool,
}

impl CampaignPipeline {
    pub fn new(
        config: &CampaignConfig,
        llm: Arc<dyn LlmProvider>,
        transport: Arc<dyn MailTransport>,
        inbox: Arc<dyn Inbox>,
    ) -> Result<Self, ComposeError> {
        Ok(Self {
            enricher: LeadEnricher::new(Arc::clone(&llm)),
            composer: MessageComposer::new(&config.smtp.from_name)?,
            classifier: ReplyClassifier::new(llm, ReplyRules::default_rules()),
            transport,
            inbox,
            campaign_address: config.smtp.from_address.clone(),
            generate_fake_replies: config.generate_fake_replies,
        })
    }

    /// Run the full campaign and return the final, sorted records.
    ///
    /// Always returns exactly one record per input lead.
    pub async fn run(&self, leads: Vec<Lead>) -> Vec<OutreachRecord> {
        info!(leads = leads.len(), "Starting pipeline");
        let (mut records, sent) = self.run_outreach(leads).await;

        if self.generate_fake_replies {
            let picked = pick_replies(&mut rand::thread_rng(), DEFAULT_SIMULATED_REPLIES);
            ReplySimulator::new(Arc::clone(&self.transport), &self.campaign_address)
                .simulate(&sent, &picked)
                .await;
        }

        let replies = self.collect_replies().await;
        self.apply_replies(&mut records, replies).await;
        sort_results(&mut records);
        records
    }

    /// Process every lead sequentially, in input order.
    pub async fn run_outreach(&self, leads: Vec<Lead>) -> (Vec<OutreachRecord>, Vec<SentMessage>) {
        let total = leads.len();
        let mut records = Vec::with_capacity(total);
        let mut sent = Vec::new();

        for (idx, lead) in leads.into_iter().enumerate() {
            let outcome = self.process_lead(&lead).await;
            info!(
                "[{}/{}] {} -> {} (priority {})",
                idx + 1,
                total,
                outcome.record.lead.get("email").unwrap_or(""),
                outcome.record.status,
                outcome.record.priority,
            );
            records.push(outcome.record);
            sent.extend(outcome.sent);
        }

        (records, sent)
    }

    /// Enrich, compose, and deliver a single lead.
    pub async fn process_lead(&self, lead: &Lead) -> LeadOutcome {
        let enrichment = self.enricher.enrich(lead).await;

        let composed = match self.composer.compose_enriched(&enrichment.lead, &enrichment.result) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Failed to compose message, skipping delivery");
                let status = DeliveryStatus::SendError(e.to_string());
                return LeadOutcome {
                    record: OutreachRecord::pending(enrichment, String::new(), String::new(), status),
                    sent: None,
                };
            }
        };

        let recipient = enrichment
            .lead
            .get("email")
            .unwrap_or(MISSING_EMAIL_RECIPIENT)
            .to_string();
        let email = OutgoingEmail::new(&recipient, &composed.subject, &composed.body);

        let (status, sent) = match self.transport.send(&email).await {
            Ok(message_id) => (
                DeliveryStatus::Sent,
                Some(SentMessage {
                    email: enrichment.lead.get("email").unwrap_or("").to_string(),
                    subject: composed.subject.clone(),
                    message_id,
                }),
            ),
            Err(e) => {
                warn!(to = %recipient, error = %e, "Delivery failed");
                (DeliveryStatus::SendError(e.to_string()), None)
            }
        };

        LeadOutcome {
            record: OutreachRecord::pending(enrichment, composed.subject, composed.body, status),
            sent,
        }
    }

    /// Replies addressed to the campaign, in inbox order. Empty on fetch failure.
    pub async fn collect_replies(&self) -> Vec<ReplyRecord> {
        match self.inbox.fetch_all().await {
            Ok(messages) => {
                let replies = replies_addressed_to(&messages, &self.campaign_address);
                info!(inbox = messages.len(), replies = replies.len(), "Collected replies");
                replies
            }
            Err(e) => {
                warn!(error = %e, "Inbox fetch failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Pair the Nth reply with the Nth record, regardless of sender.
    ///
    /// There is no reliable way to tie a reply to the lead that prompted it,
    /// so matching is purely positional. Extra replies or records are left alone.
    pub async fn apply_replies(&self, records: &mut [OutreachRecord], replies: Vec<ReplyRecord>) {
        for (record, reply) in records.iter_mut().zip(replies) {
            let category = self.classifier.classify(&reply.body).await;
            record.last_response = truncate_chars(&reply.body, MAX_RESPONSE_CHARS);
            record.response_category = category;
            record.status = DeliveryStatus::Replied;
        }
    }
}

/// Stable sort: category label ascending, then priority descending.
pub fn sort_results(records: &mut [OutreachRecord]) {
    records.sort_by(|a, b| {
        a.response_category
            .label()
            .cmp(b.response_category.label())
            .then_with(|| b.priority.cmp(&a.priority))
    });
}

/// First `max` characters (not bytes) of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
