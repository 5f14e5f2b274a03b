//! Outreach pipeline: enrich leads, send outreach, classify replies, report.

pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod store;
