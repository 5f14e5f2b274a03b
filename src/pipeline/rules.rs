//! Ordered reply rules for fast classification.
//!
//! Runs before the generative fallback to catch the common reply shapes:
//! - opt-out requests → Unsubscribe
//! - auto-responders → Out of Office
//! - explicit refusals → Not Interested
//! - meeting requests → Interested
//! - delivery failures → Bounce
//!
//! Rules are evaluated in order and the first match wins. Order is
//! load-bearing: "not interested" contains "interested", so the refusal
//! rule must come before the interest rule.

use tracing::debug;

use crate::pipeline::types::Category;

/// A single rule: any needle found in the lowercased text selects `category`.
#[derive(Debug, Clone)]
pub struct ReplyRule {
    /// Lowercase substrings to look for.
    pub needles: Vec<String>,
    /// Category assigned on match.
    pub category: Category,
}

impl ReplyRule {
    pub fn new(needles: &[&str], category: Category) -> Self {
        Self {
            needles: needles.iter().map(|n| n.to_lowercase()).collect(),
            category,
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.needles.iter().any(|n| lowered.contains(n.as_str()))
    }
}

/// Ordered first-match-wins rule list.
#[derive(Debug, Clone)]
pub struct ReplyRules {
    rules: Vec<ReplyRule>,
}

impl ReplyRules {
    /// The standard outreach reply rules.
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                ReplyRule::new(&["unsubscribe", "remove me"], Category::Unsubscribe),
                ReplyRule::new(&["out of office", "ooo"], Category::OutOfOffice),
                ReplyRule::new(&["not interested", "no thanks"], Category::NotInterested),
                ReplyRule::new(
                    &["interested", "let's talk", "book a call"],
                    Category::Interested,
                ),
                ReplyRule::new(&["bounce", "delivery failed"], Category::Bounce),
            ],
        }
    }

    /// Evaluate text against the rules.
    ///
    /// Returns `Some(Category)` on the first matching rule, `None` if nothing
    /// matches (fall through to the generative fallback).
    pub fn evaluate(&self, text: &str) -> Option<Category> {
        let lowered = text.to_lowercase();
        let hit = self.rules.iter().find(|r| r.matches(&lowered))?;
        debug!(category = %hit.category, "Reply matched rule");
        Some(hit.category.clone())
    }
}

impl Default for ReplyRules {
    fn default() -> Self {
        Self::default_rules()
    }
}
