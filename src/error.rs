//! Error types for the analysis core.
//!
//! Three families surface to callers:
//! - **Malformed input:** rejected before any simulation starts.
//! - **Degenerate computation:** metrics that cannot be formed from the data.
//! - **I/O:** loading and exporting CSV files (binary side only).
//!
//! Cancellation is not an error; see [`crate::analysis::PassOutcome`].

use std::io;
use thiserror::Error;

use crate::model::AnalysisKind;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A dataset group had no samples
    #[error("{group} dataset is empty")]
    EmptyDataset { group: &'static str },

    /// Gains list length does not match the actuator kind
    #[error("{kind} expects {expected} feedforward gains, got {got}")]
    GainCount {
        kind: AnalysisKind,
        expected: usize,
        got: usize,
    },

    /// A gain cannot drive the simulation (Ka of zero, NaN, infinity)
    #[error("invalid gain {name} = {value}")]
    InvalidGain { name: &'static str, value: f64 },

    /// Test boundary set was not exactly four timestamps
    #[error("expected 4 test start timestamps, got {got}")]
    BoundaryCount { got: usize },

    /// Simulation was asked to step backwards in time
    #[error("negative time step {dt} s")]
    NegativeDt { dt: f64 },

    /// No comparable points were accumulated for RMSE / R²
    #[error("insufficient data: no simulated points to score")]
    InsufficientData,

    /// Measured velocity was zero everywhere, so R² has no denominator
    #[error("measured velocity has zero variance")]
    ZeroVariance,

    /// Regression matrix could not be inverted
    #[error("feedforward regression is singular; data does not excite every term")]
    SingularFit,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalysisError {
    /// True for errors raised by input validation, before any work is done.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            AnalysisError::EmptyDataset { .. }
                | AnalysisError::GainCount { .. }
                | AnalysisError::InvalidGain { .. }
                | AnalysisError::BoundaryCount { .. }
                | AnalysisError::InvalidInput(_)
        )
    }
}
