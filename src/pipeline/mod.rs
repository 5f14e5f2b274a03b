//! Outreach pipeline.
//!
//! Every lead flows through:
//! 1. `LeadEnricher::enrich()` — model-assisted persona/priority (defaults on failure)
//! 2. `MessageComposer::compose()` — template rendering
//! 3. `MailTransport::send()` — delivery, failures recorded per lead
//!
//! After all leads, inbox replies are matched to records by position and
//! classified by `ReplyClassifier` (rules first, model fallback).

pub mod classifier;
pub mod composer;
pub mod enricher;
pub mod processor;
pub mod replies;
pub mod rules;
pub mod types;

pub use classifier::ReplyClassifier;
pub use composer::{ComposedMessage, MessageComposer};
pub use enricher::{DecodeError, LeadEnricher, decode_enrichment};
pub use processor::{CampaignPipeline, LeadOutcome, sort_results};
pub use rules::{ReplyRule, ReplyRules};
pub use types::{
    Category, DeliveryStatus, Enrichment, EnrichmentResult, Lead, OutreachRecord, ReplyRecord,
};
