//! # sysid_analysis
//!
//! Analysis core for actuator feedforward characterization.
//!
//! Recorded (or synthesized) quasistatic and dynamic tests go in; plot-ready series,
//! best-fit lines, simulated trajectories and RMSE / R² come out.
//!
//! ## Layout
//! - [`model`]: feedforward gains and the simple motor, elevator and arm simulators.
//! - [`data`]: samples, test boundaries, CSV loading, smoothing, synthetic captures.
//! - [`analysis`]: segmentation, decomposition, fit lines, fit quality, resampling,
//!   gain regression and the shared [`analysis::AnalyzerPlot`] state.
//! - [`utils`]: summary statistics and CSV export.
//!
//! ## Concurrency
//! One writer runs a pass and swaps the result in under a mutex; readers use a
//! non-blocking `try_lock` and skip a frame on contention. Passes poll an
//! `AtomicBool` cancel flag and never leave partial results behind.

pub mod config;
pub mod error;
pub mod model;
pub mod data;
pub mod analysis;
pub mod utils;

pub use analysis::{AnalysisRequest, AnalyzerPlot, PassOutcome, PlotData, SeriesKind};
pub use error::{AnalysisError, Result};
pub use model::{AnalysisKind, FeedforwardGains};
