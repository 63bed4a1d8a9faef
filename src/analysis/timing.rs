//! Sample interval statistics.
//!
//! Captures run at a nominal rate but the recorded spacing jitters. The interval
//! series and its mean let the presentation layer show how regular the capture was.

use average::Mean;

use crate::analysis::Point;
use crate::config::MAX_VALID_DT_SECS;
use crate::data::{Sample, Storage, TestBoundaries};

/// Mean `dt` in seconds across both groups, ignoring zero intervals and gaps of
/// [`MAX_VALID_DT_SECS`] or more. `None` when no interval qualifies.
pub fn mean_time_delta(data: &Storage) -> Option<f64> {
    let mean: Mean = data
        .slow
        .iter()
        .chain(data.fast.iter())
        .map(|s| s.dt)
        .filter(|&dt| dt > 0.0 && dt < MAX_VALID_DT_SECS)
        .collect();
    if mean.is_empty() { None } else { Some(mean.mean()) }
}

/// Interval point for sample index `i`, in milliseconds, if it belongs in the series.
///
/// The first sample, zero intervals and test starts are left out; the interval
/// leading into a test start spans the gap between tests.
#[inline]
pub fn interval_point(i: usize, s: &Sample, boundaries: &TestBoundaries) -> Option<Point> {
    if i > 0 && s.dt > 0.0 && !boundaries.contains(s.timestamp) {
        Some(Point::new(s.timestamp, s.dt * 1000.0))
    } else {
        None
    }
}

/// Horizontal mean-dt reference line, in milliseconds, over the capture's time span.
pub fn mean_dt_line(data: &Storage) -> Vec<Point> {
    match (mean_time_delta(data), data.time_span()) {
        (Some(mean), Some((start, end))) => {
            let ms = mean * 1000.0;
            vec![Point::new(start, ms), Point::new(end, ms)]
        }
        _ => Vec::new(),
    }
}
