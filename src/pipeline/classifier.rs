//! Reply classifier: ordered rules first, generative fallback second.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::LlmProvider;
use crate::pipeline::rules::ReplyRules;
use crate::pipeline::types::Category;

/// Single-label output: a handful of tokens is enough.
const CLASSIFY_MAX_TOKENS: u32 = 5;
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Maps free-form reply text to a [`Category`].
pub struct ReplyClassifier {
    llm: Arc<dyn LlmProvider>,
    rules: ReplyRules,
}

impl ReplyClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, rules: ReplyRules) -> Self {
        Self { llm, rules }
    }

    /// Classify a reply.
    ///
    /// The fallback label is taken verbatim (first line, trimmed) and is not
    /// checked against the known set. Any fallback failure yields `Other`.
    pub async fn classify(&self, text: &str) -> Category {
        if let Some(category) = self.rules.evaluate(text) {
            return category;
        }

        let prompt = build_classify_prompt(text);
        match self
            .llm
            .generate(&prompt, CLASSIFY_TEMPERATURE, CLASSIFY_MAX_TOKENS)
            .await
        {
            Ok(raw) => match first_line_label(&raw) {
                Some(label) => {
                    debug!(label = %label, "Reply classified by model");
                    Category::from_label(&label)
                }
                None => {
                    warn!("Model returned an empty label, using Other");
                    Category::Other
                }
            },
            Err(e) => {
                warn!(error = %e, "Reply classification fallback failed, using Other");
                Category::Other
            }
        }
    }
}

/// Build the constrained single-label prompt.
fn build_classify_prompt(text: &str) -> String {
    format!(
        "Classify the email reply into one of: {}.\nReply with only the label.\n\nEmail:\n{}\n",
        Category::FALLBACK_LABELS.join(", "),
        text
    )
}

/// First line of the model output, trimmed. `None` if there is no line at all.
fn first_line_label(raw: &str) -> Option<String> {
    raw.lines().next().map(|l| l.trim().to_string())
}
