//! Domain types and shared helpers for the deadline chart.
//!
//! Holds the due-date and histogram models, the error type, `YYMMDD`
//! date handling, label formatting and CLI settings used by the data,
//! UI and binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{DeadlineError, Result};
