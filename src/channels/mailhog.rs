//! MailHog v2 inbox client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::channels::Inbox;
use crate::error::TransportError;
use crate::pipeline::types::ReplyRecord;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// `GET /api/v2/messages` payload. Only the fields the pipeline needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    /// Items that fail to decode are skipped, the rest are kept in order.
    #[serde(default, deserialize_with = "lenient_items")]
    pub items: Vec<InboxMessage>,
}

/// One stored message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxMessage {
    #[serde(rename = "To", default, deserialize_with = "null_as_default")]
    pub to: Vec<MailPath>,
    #[serde(rename = "Content", default, deserialize_with = "null_as_default")]
    pub content: MessageContent,
}

/// A recipient split into local part and domain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailPath {
    #[serde(rename = "Mailbox", default, deserialize_with = "null_as_default")]
    pub mailbox: String,
    #[serde(rename = "Domain", default, deserialize_with = "null_as_default")]
    pub domain: String,
}

impl MailPath {
    pub fn address(&self) -> String {
        format!("{}@{}", self.mailbox, self.domain)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageContent {
    #[serde(rename = "Body", default, deserialize_with = "null_as_default")]
    pub body: String,
}

/// MailHog is written in Go and encodes nil slices and maps as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<InboxMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Value> = null_as_default(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value(item) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(index = idx, error = %e, "Skipping undecodable inbox item");
                None
            }
        })
        .collect())
}

impl InboxMessage {
    pub fn recipients(&self) -> impl Iterator<Item = String> + '_ {
        self.to.iter().map(MailPath::address)
    }
}

/// HTTP client for the MailHog message API.
pub struct MailHogInbox {
    client: reqwest::Client,
    url: String,
}

impl MailHogInbox {
    /// `url` is the full messages endpoint, e.g. `http://mailhog:8025/api/v2/messages`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Inbox for MailHogInbox {
    async fn fetch_all(&self) -> Result<Vec<InboxMessage>, TransportError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| TransportError::InboxFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::InboxFetch(format!("HTTP {status}")));
        }

        let list: MessageList = response
            .json()
            .await
            .map_err(|e| TransportError::InboxFetch(format!("invalid payload: {e}")))?;

        debug!(total = list.total, items = list.items.len(), "Fetched inbox");
        Ok(list.items)
    }
}

/// Bodies of messages sent to `address`, in inbox order.
pub fn replies_addressed_to(messages: &[InboxMessage], address: &str) -> Vec<ReplyRecord> {
    messages
        .iter()
        .filter(|m| m.recipients().any(|r| r == address))
        .enumerate()
        .map(|(arrival_order, m)| ReplyRecord {
            body: m.content.body.clone(),
            arrival_order,
        })
        .collect()
}
