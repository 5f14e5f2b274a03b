//! Shared types for the outreach pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Lead ────────────────────────────────────────────────────────────

/// A prospect record: named string fields in source-column order.
///
/// Identity is the row position in the input table, not any field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    fields: Vec<(String, String)>,
}

impl Lead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Field value, if the column exists.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Field value, treating an empty string as absent.
    pub fn get_nonempty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Set a field, overwriting in place or appending a new column.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Copy with `overlay` applied on top. Overlay wins on conflict.
    pub fn overlay<I, K, V>(&self, overlay: I) -> Lead
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged = self.clone();
        for (k, v) in overlay {
            merged.set(k, v);
        }
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object view for prompts.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Lead {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut lead = Lead::new();
        for (k, v) in iter {
            lead.set(k, v);
        }
        lead
    }
}

// ── Category ────────────────────────────────────────────────────────

/// Reply classification label.
///
/// `Unlisted` carries a label produced by the generative fallback that is not
/// one of the known categories. It is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Category {
    Interested,
    NotInterested,
    OutOfOffice,
    FollowUpLater,
    Unsubscribe,
    Bounce,
    Other,
    #[default]
    NoResponseYet,
    Unlisted(String),
}

impl Category {
    /// Labels offered to the generative fallback, in prompt order.
    pub const FALLBACK_LABELS: [&'static str; 7] = [
        "Interested",
        "Not Interested",
        "Out of Office",
        "Follow Up Later",
        "Unsubscribe",
        "Bounce",
        "Other",
    ];

    /// Display label. Sorting is lexicographic on this.
    pub fn label(&self) -> &str {
        match self {
            Self::Interested => "Interested",
            Self::NotInterested => "Not Interested",
            Self::OutOfOffice => "Out of Office",
            Self::FollowUpLater => "Follow Up Later",
            Self::Unsubscribe => "Unsubscribe",
            Self::Bounce => "Bounce",
            Self::Other => "Other",
            Self::NoResponseYet => "No Response Yet",
            Self::Unlisted(label) => label,
        }
    }

    /// Map a label to a category. Unknown labels are kept as `Unlisted`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Interested" => Self::Interested,
            "Not Interested" => Self::NotInterested,
            "Out of Office" => Self::OutOfOffice,
            "Follow Up Later" => Self::FollowUpLater,
            "Unsubscribe" => Self::Unsubscribe,
            "Bounce" => Self::Bounce,
            "Other" => Self::Other,
            "No Response Yet" => Self::NoResponseYet,
            other => Self::Unlisted(other.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Delivery status ─────────────────────────────────────────────────

/// Outcome of delivering the outreach email, later overwritten on reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    SendError(String),
    Replied,
}

impl DeliveryStatus {
    /// True if the message left our hands (sent, or replied to).
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Sent | Self::Replied)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => f.write_str("Sent"),
            Self::SendError(cause) => write!(f, "SendError: {cause}"),
            Self::Replied => f.write_str("Replied"),
        }
    }
}

// ── Enrichment ──────────────────────────────────────────────────────

/// Model-derived facts about a lead. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentResult {
    pub persona: String,
    /// Always within `1..=100`.
    pub priority: i64,
    pub insight: String,
    pub value_prop: String,
    /// Guessed values for missing lead fields, in model output order.
    pub enriched_fields: Vec<(String, String)>,
}

impl EnrichmentResult {
    pub const DEFAULT_PERSONA: &'static str = "Unknown";
    pub const DEFAULT_PRIORITY: i64 = 50;
    pub const DEFAULT_INSIGHT: &'static str = "recent growth";
    pub const DEFAULT_VALUE_PROP: &'static str = "automate manual steps";

    /// The fixed safe record used when enrichment fails.
    pub fn fallback() -> Self {
        Self {
            persona: Self::DEFAULT_PERSONA.to_string(),
            priority: Self::DEFAULT_PRIORITY,
            insight: Self::DEFAULT_INSIGHT.to_string(),
            value_prop: Self::DEFAULT_VALUE_PROP.to_string(),
            enriched_fields: Vec::new(),
        }
    }
}

/// Enricher output: the lead with guesses merged in, plus the facts.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub lead: Lead,
    pub result: EnrichmentResult,
}

// ── Outreach record ─────────────────────────────────────────────────

/// Per-lead output state.
///
/// Only `status`, `last_response`, and `response_category` change after
/// creation, and only once, during reply matching.
#[derive(Debug, Clone)]
pub struct OutreachRecord {
    pub lead: Lead,
    pub persona: String,
    pub priority: i64,
    pub insight: String,
    pub value_prop: String,
    pub subject: String,
    pub body: String,
    pub status: DeliveryStatus,
    pub last_response: String,
    pub response_category: Category,
}

impl OutreachRecord {
    /// A freshly delivered (or failed) record awaiting replies.
    pub fn pending(
        enrichment: Enrichment,
        subject: String,
        body: String,
        status: DeliveryStatus,
    ) -> Self {
        let Enrichment { lead, result } = enrichment;
        Self {
            lead,
            persona: result.persona,
            priority: result.priority,
            insight: result.insight,
            value_prop: result.value_prop,
            subject,
            body,
            status,
            last_response: String::new(),
            response_category: Category::NoResponseYet,
        }
    }
}

/// An inbound reply body, in inbox return order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRecord {
    pub body: String,
    pub arrival_order: usize,
}
