//! Tabular I/O: the lead table in, the result table out.

pub mod leads;
pub mod results;

pub use leads::{load_leads, read_leads};
pub use results::{RESULT_COLUMNS, write_results, write_results_to};
