//! Outreach message rendering.

use handlebars::Handlebars;
use serde_json::json;

use crate::error::ComposeError;
use crate::pipeline::types::{EnrichmentResult, Lead};

const BODY_TEMPLATE_NAME: &str = "outreach_body";

/// Used in the subject and the first body slot when `company` is empty.
pub const COMPANY_FALLBACK: &str = "your team";
/// Used in the closing body slot when `company` is empty.
pub const CONTEXT_FALLBACK: &str = "your context";

const BODY_TEMPLATE: &str = "\
Hi {{#if first_name}}{{first_name}}{{else}}{{name}}{{/if}},

I noticed {{#if company}}{{company}}{{else}}your team{{/if}} {{insight}}. We help {{persona}} teams save time by {{value_prop}}.

Would you be open to a quick chat next week? Happy to share a short demo tailored to {{#if company}}{{company}}{{else}}your context{{/if}}.

Best,
{{sender_name}}";

/// A rendered subject/body pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub subject: String,
    pub body: String,
}

/// Renders outreach emails. Pure: no I/O, no model calls.
pub struct MessageComposer {
    registry: Handlebars<'static>,
    sender_name: String,
}

impl MessageComposer {
    pub fn new(sender_name: impl Into<String>) -> Result<Self, ComposeError> {
        let mut registry = Handlebars::new();
        // Plain-text email, nothing to escape
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_template_string(BODY_TEMPLATE_NAME, BODY_TEMPLATE)?;
        Ok(Self {
            registry,
            sender_name: sender_name.into(),
        })
    }

    /// Render the subject and body for a lead.
    pub fn compose(
        &self,
        lead: &Lead,
        persona: &str,
        insight: &str,
        value_prop: &str,
    ) -> Result<ComposedMessage, ComposeError> {
        let company = lead.get_nonempty("company");
        let subject = format!("Quick idea for {}", company.unwrap_or(COMPANY_FALLBACK));

        let data = json!({
            "first_name": lead.get("first_name").unwrap_or(""),
            "name": lead.get("name").unwrap_or(""),
            "company": company.unwrap_or(""),
            "persona": persona,
            "insight": insight,
            "value_prop": value_prop,
            "sender_name": self.sender_name,
        });
        let body = self.registry.render(BODY_TEMPLATE_NAME, &data)?;

        Ok(ComposedMessage { subject, body })
    }

    /// Convenience wrapper taking the enrichment facts directly.
    pub fn compose_enriched(
        &self,
        lead: &Lead,
        facts: &EnrichmentResult,
    ) -> Result<ComposedMessage, ComposeError> {
        self.compose(lead, &facts.persona, &facts.insight, &facts.value_prop)
    }
}
