//! Lead enrichment: persona, priority, insight, and value prop from the model.
//!
//! Model output is untrusted. [`decode_enrichment`] does a best-effort
//! structured decode and [`LeadEnricher::enrich`] swaps in
//! [`EnrichmentResult::fallback`] on any failure, so enrichment never aborts
//! the campaign.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::LlmProvider;
use crate::pipeline::types::{Enrichment, EnrichmentResult, Lead};

const ENRICH_TEMPERATURE: f32 = 0.3;
const ENRICH_MAX_TOKENS: u32 = 300;

/// Greedy: spans from the first `{` to the last `}` across lines.
static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

/// Why a model response could not be used.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("priority is not numeric: {0}")]
    InvalidPriority(String),

    #[error("enriched must be an object, got {0}")]
    InvalidEnriched(String),
}

/// Calls the model once per lead and merges its guesses into the lead.
pub struct LeadEnricher {
    llm: Arc<dyn LlmProvider>,
}

impl LeadEnricher {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Enrich a lead. Infallible by contract.
    pub async fn enrich(&self, lead: &Lead) -> Enrichment {
        let prompt = build_enrich_prompt(lead);

        let result = match self
            .llm
            .generate(&prompt, ENRICH_TEMPERATURE, ENRICH_MAX_TOKENS)
            .await
        {
            Ok(raw) => decode_enrichment(&raw).unwrap_or_else(|e| {
                warn!(
                    email = lead.get("email").unwrap_or(""),
                    error = %e,
                    "Unusable enrichment response, using defaults"
                );
                debug!(raw_response = %raw, "Rejected enrichment response");
                EnrichmentResult::fallback()
            }),
            Err(e) => {
                warn!(
                    email = lead.get("email").unwrap_or(""),
                    error = %e,
                    "Enrichment call failed, using defaults"
                );
                EnrichmentResult::fallback()
            }
        };

        Enrichment {
            lead: lead.overlay(result.enriched_fields.iter().cloned()),
            result,
        }
    }
}

/// Build the enrichment prompt with the lead embedded as JSON.
fn build_enrich_prompt(lead: &Lead) -> String {
    format!(
        "You are an SDR assistant. Given the lead JSON, return a compact JSON with fields:\n\
         persona (string), priority (1-100 integer), missing_fields (list of keys to fill), \
         insight (short 1 line), value_prop (short 1 line), enriched (dict with any missing fields guessed).\n\n\
         Return ONLY JSON.\n\
         Lead: {}\n",
        lead.to_json()
    )
}

/// Decode an enrichment record out of raw model text.
///
/// Locates the outermost `{...}` span (tolerating chatter around it), falling
/// back to the whole text if there is none. Missing keys get per-field
/// defaults; a non-numeric priority or a non-object `enriched` is an error.
pub fn decode_enrichment(raw: &str) -> Result<EnrichmentResult, DecodeError> {
    let candidate = JSON_SPAN.find(raw).map_or(raw, |m| m.as_str());
    let value: Value = serde_json::from_str(candidate)?;
    let Value::Object(data) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let text_field = |key: &str, default: &str| match data.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(v) => value_to_text(v),
    };

    let priority = match data.get("priority") {
        None | Some(Value::Null) => EnrichmentResult::DEFAULT_PRIORITY,
        Some(v) => coerce_priority(v)?,
    };

    let enriched_fields = match data.get("enriched") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), value_to_text(v)))
            .collect(),
        Some(other) => return Err(DecodeError::InvalidEnriched(other.to_string())),
    };

    Ok(EnrichmentResult {
        persona: text_field("persona", EnrichmentResult::DEFAULT_PERSONA),
        priority: priority.clamp(1, 100),
        insight: text_field("insight", EnrichmentResult::DEFAULT_INSIGHT),
        value_prop: text_field("value_prop", EnrichmentResult::DEFAULT_VALUE_PROP),
        enriched_fields,
    })
}

/// Integers pass through, floats truncate, numeric strings parse.
fn coerce_priority(value: &Value) -> Result<i64, DecodeError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| DecodeError::InvalidPriority(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| DecodeError::InvalidPriority(s.clone())),
        other => Err(DecodeError::InvalidPriority(other.to_string())),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse};

    // ── Decode tests ────────────────────────────────────────────────

    #[test]
    fn decode_plain_object() {
        let raw = r#"{"persona": "Head of Ops", "priority": 82, "missing_fields": ["title"],
                     "insight": "opened a second warehouse", "value_prop": "cutting pick errors",
                     "enriched": {"title": "VP Operations"}}"#;
        let result = decode_enrichment(raw).unwrap();
        assert_eq!(result.persona, "Head of Ops");
        assert_eq!(result.priority, 82);
        assert_eq!(result.insight, "opened a second warehouse");
        assert_eq!(result.value_prop, "cutting pick errors");
        assert_eq!(
            result.enriched_fields,
            vec![("title".to_string(), "VP Operations".to_string())]
        );
    }

    #[test]
    fn decode_object_wrapped_in_chatter() {
        let raw = "Sure! Here is the JSON:\n```json\n{\"persona\": \"CFO\", \"priority\": 70}\n```\nLet me know.";
        let result = decode_enrichment(raw).unwrap();
        assert_eq!(result.persona, "CFO");
        assert_eq!(result.priority, 70);
        assert_eq!(result.insight, EnrichmentResult::DEFAULT_INSIGHT);
    }

    #[test]
    fn decode_missing_keys_get_defaults() {
        let result = decode_enrichment("{}").unwrap();
        assert_eq!(result, EnrichmentResult::fallback());
    }

    #[test]
    fn decode_numeric_string_and_float_priority() {
        assert_eq!(decode_enrichment(r#"{"priority": " 64 "}"#).unwrap().priority, 64);
        assert_eq!(decode_enrichment(r#"{"priority": 71.9}"#).unwrap().priority, 71);
    }

    #[test]
    fn decode_clamps_priority() {
        assert_eq!(decode_enrichment(r#"{"priority": 250}"#).unwrap().priority, 100);
        assert_eq!(decode_enrichment(r#"{"priority": -3}"#).unwrap().priority, 1);
    }

    #[test]
    fn decode_rejects_non_numeric_priority() {
        let err = decode_enrichment(r#"{"priority": "high"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPriority(_)));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_enrichment("I cannot help with that."),
            Err(DecodeError::Json(_))
        ));
        assert!(decode_enrichment("{persona: CFO}").is_err());
    }

    #[test]
    fn decode_rejects_non_object_payloads() {
        assert!(matches!(decode_enrichment("[1, 2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(
            decode_enrichment(r#"{"enriched": ["title"]}"#),
            Err(DecodeError::InvalidEnriched(_))
        ));
    }

    #[test]
    fn decode_stringifies_non_string_values() {
        let result =
            decode_enrichment(r#"{"persona": 7, "enriched": {"employees": 120, "hq": null}}"#).unwrap();
        assert_eq!(result.persona, "7");
        assert_eq!(
            result.enriched_fields,
            vec![
                ("employees".to_string(), "120".to_string()),
                ("hq".to_string(), String::new()),
            ]
        );
    }

    // ── Enricher tests ──────────────────────────────────────────────

    struct FixedLlm(Result<&'static str, ()>);

    #[async_trait]
    impl LlmProvider for FixedLlm {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            assert!(request.prompt_text().contains("Return ONLY JSON."));
            assert_eq!(request.max_tokens, Some(ENRICH_MAX_TOKENS));
            match self.0 {
                Ok(text) => Ok(CompletionResponse {
                    content: text.to_string(),
                }),
                Err(()) => Err(LlmError::BackendUnavailable {
                    provider: "fixed".into(),
                    reason: "timed out".into(),
                }),
            }
        }
    }

    fn lead() -> Lead {
        Lead::new()
            .with("email", "dana@northwind.test")
            .with("name", "Dana")
            .with("company", "")
    }

    #[tokio::test]
    async fn enrich_overlays_guessed_fields() {
        let llm = Arc::new(FixedLlm(Ok(
            r#"{"persona": "Founder", "priority": 90, "enriched": {"company": "Northwind", "name": "Dana Q."}}"#,
        )));
        let enrichment = LeadEnricher::new(llm).enrich(&lead()).await;
        assert_eq!(enrichment.lead.get("company"), Some("Northwind"));
        assert_eq!(enrichment.lead.get("name"), Some("Dana Q."));
        assert_eq!(enrichment.lead.get("email"), Some("dana@northwind.test"));
        assert_eq!(enrichment.result.persona, "Founder");
        assert_eq!(enrichment.result.priority, 90);
    }

    #[tokio::test]
    async fn enrich_garbage_uses_defaults() {
        let llm = Arc::new(FixedLlm(Ok("Sorry, I am just a language model.")));
        let enrichment = LeadEnricher::new(llm).enrich(&lead()).await;
        assert_eq!(enrichment.result, EnrichmentResult::fallback());
        assert_eq!(enrichment.lead, lead());
    }

    #[tokio::test]
    async fn enrich_backend_failure_uses_defaults() {
        let llm = Arc::new(FixedLlm(Err(())));
        let enrichment = LeadEnricher::new(llm).enrich(&lead()).await;
        assert_eq!(enrichment.result, EnrichmentResult::fallback());
    }

    #[test]
    fn prompt_embeds_lead_json() {
        let prompt = build_enrich_prompt(&lead());
        assert!(prompt.contains(r#""email":"dana@northwind.test""#));
        assert!(prompt.contains("missing_fields"));
        assert!(prompt.contains("value_prop"));
    }
}
