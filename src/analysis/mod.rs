//! Analysis core: everything between prepared samples and plot-ready output.
//!
//! Leaf passes live in their own modules; [`plot_data`] runs them in order and
//! owns the state a presentation layer reads.

pub mod segmenter;
pub mod resampler;
pub mod decomposer;
pub mod fit_lines;
pub mod fit_quality;
pub mod timing;
pub mod feedforward;
pub mod plot_data;

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

pub use feedforward::{FeedforwardFit, calculate_feedforward_gains};
pub use fit_quality::FitMetrics;
pub use plot_data::{AnalysisRequest, AnalyzerPlot, PlotData, SeriesKind};

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How an analysis pass ended. Cancellation is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// New results replaced the previous ones.
    Committed,
    /// Aborted through the cancel flag; previous results are still visible.
    Cancelled,
}

#[inline]
pub(crate) fn is_cancelled(cancel: &AtomicBool) -> bool {
    cancel.load(Ordering::Relaxed)
}
