//! Terminal UI layer for Deadline Chart.
//!
//! Provides themes, the daily due-date bar chart view, and the application
//! event loop built on top of [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod themes;

pub use deadline_core as core;
