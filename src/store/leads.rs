//! Lead table loading.

use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::StoreError;
use crate::pipeline::types::Lead;

/// Load leads from a CSV file. `max_leads == 0` means no cap.
pub fn load_leads(path: &Path, max_leads: usize) -> Result<Vec<Lead>, StoreError> {
    let file = std::fs::File::open(path)?;
    let leads = read_leads(file, max_leads).map_err(|source| StoreError::Csv {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), count = leads.len(), "Loaded leads");
    Ok(leads)
}

/// Read leads from any CSV source.
///
/// The header row names the fields. Cells are trimmed; short rows get empty
/// values for the missing columns.
pub fn read_leads<R: Read>(source: R, max_leads: usize) -> Result<Vec<Lead>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut leads = Vec::new();
    for row in reader.records() {
        if max_leads > 0 && leads.len() >= max_leads {
            break;
        }
        let row = row?;
        let lead: Lead = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), row.get(i).unwrap_or("").trim().to_string()))
            .collect();
        leads.push(lead);
    }
    Ok(leads)
}
