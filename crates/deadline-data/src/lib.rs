//! Data layer for Deadline Chart.
//!
//! Decodes ERP CSV exports, extracts due dates, persists them together
//! with upload history, and aggregates stored dates into daily buckets.

pub mod aggregator;
pub mod extractor;
pub mod ingest;
pub mod reader;
pub mod report;
pub mod store;

pub use deadline_core as core;
