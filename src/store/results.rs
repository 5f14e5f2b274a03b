//! Result table writing.

use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::StoreError;
use crate::pipeline::types::OutreachRecord;

/// Fixed columns appended after the lead's own fields.
pub const RESULT_COLUMNS: [&str; 9] = [
    "persona",
    "priority",
    "insight",
    "value_prop",
    "email_subject",
    "email_body",
    "status",
    "last_response",
    "response_category",
];

/// Write the final records to a CSV file.
pub fn write_results(path: &Path, records: &[OutreachRecord]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_results_to(file, records).map_err(|source| StoreError::Csv {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), rows = records.len(), "Wrote results");
    Ok(())
}

/// Write records as CSV to any sink.
///
/// Lead columns come first, in the order they are first seen across records.
pub fn write_results_to<W: Write>(sink: W, records: &[OutreachRecord]) -> Result<(), csv::Error> {
    let lead_columns = lead_columns(records);
    let mut writer = csv::Writer::from_writer(sink);

    writer.write_record(lead_columns.iter().copied().chain(RESULT_COLUMNS))?;

    for record in records {
        let priority = record.priority.to_string();
        let status = record.status.to_string();
        let fixed = [
            record.persona.as_str(),
            priority.as_str(),
            record.insight.as_str(),
            record.value_prop.as_str(),
            record.subject.as_str(),
            record.body.as_str(),
            status.as_str(),
            record.last_response.as_str(),
            record.response_category.label(),
        ];
        let row = lead_columns
            .iter()
            .map(|col| record.lead.get(col).unwrap_or(""))
            .chain(fixed);
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

fn lead_columns(records: &[OutreachRecord]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for key in records.iter().flat_map(|r| r.lead.keys()) {
        if !RESULT_COLUMNS.contains(&key) && !columns.contains(&key) {
            columns.push(key);
        }
    }
    columns
}
