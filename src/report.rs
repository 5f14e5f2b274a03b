//! Markdown campaign summary.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use tracing::info;

use crate::error::StoreError;
use crate::pipeline::types::{DeliveryStatus, OutreachRecord};

const TOP_PERSONAS: usize = 5;
const NOTABLE_LEADS: usize = 5;

/// Aggregate counts over the final records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignStats {
    pub total: usize,
    /// Sent or Replied.
    pub delivered: usize,
    pub replied: usize,
    /// Category label counts, most frequent first.
    pub by_category: Vec<(String, usize)>,
    /// Up to five persona counts, most frequent first.
    pub top_personas: Vec<(String, usize)>,
}

impl CampaignStats {
    pub fn from_records(records: &[OutreachRecord]) -> Self {
        let delivered = records.iter().filter(|r| r.status.is_delivered()).count();
        let replied = records
            .iter()
            .filter(|r| r.status == DeliveryStatus::Replied)
            .count();

        let by_category = count_desc(records.iter().map(|r| r.response_category.label()));
        let mut top_personas = count_desc(records.iter().map(|r| r.persona.as_str()));
        top_personas.truncate(TOP_PERSONAS);

        Self {
            total: records.len(),
            delivered,
            replied,
            by_category,
            top_personas,
        }
    }
}

/// Count occurrences. Descending by count, ties by label.
fn count_desc<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(label, _)| label == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// Label counts as a JSON object, keys kept in slice order.
struct CountMap<'a>(&'a [(String, usize)]);

impl Serialize for CountMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(label, n)| (label, n)))
    }
}

fn counts_json(counts: &[(String, usize)]) -> String {
    serde_json::to_string_pretty(&CountMap(counts)).unwrap_or_else(|_| "{}".to_string())
}

/// Render the summary. `records` should already be in final sort order.
pub fn render_report(stats: &CampaignStats, records: &[OutreachRecord], now: NaiveDateTime) -> String {
    let mut md = format!(
        "# Campaign Summary — {}\n\n\
         - **Total Leads:** {}\n\
         - **Delivered (Sent+Replied):** {}\n\
         - **Replies:** {}\n\n\
         ## Responses by Category\n{}\n\n\
         ## Top Personas (LLM-suggested)\n{}\n\n\
         ## Notable Leads\n",
        now.format("%Y-%m-%d %H:%M"),
        stats.total,
        stats.delivered,
        stats.replied,
        counts_json(&stats.by_category),
        counts_json(&stats.top_personas),
    );

    let mut notable: Vec<&OutreachRecord> = records.iter().collect();
    notable.sort_by(|a, b| b.priority.cmp(&a.priority));
    for record in notable.into_iter().take(NOTABLE_LEADS) {
        md.push_str(&format!(
            "- {} — {} — priority {} — {}\n",
            record.lead.get("name").unwrap_or("(no name)"),
            record.lead.get("company").unwrap_or(""),
            record.priority,
            record.response_category,
        ));
    }
    md
}

/// Write the report into `dir` as `report-YYYYmmdd-HHMM.md`.
pub fn write_report(
    dir: &Path,
    stats: &CampaignStats,
    records: &[OutreachRecord],
    now: NaiveDateTime,
) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("report-{}.md", now.format("%Y%m%d-%H%M")));
    std::fs::write(&path, render_report(stats, records, now))?;
    info!(path = %path.display(), "Wrote report");
    Ok(path)
}
