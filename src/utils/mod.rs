//! Output helpers: summary statistics and CSV export.

pub mod metrics;
pub mod export;
