//! Summary statistics for exported series.
//!
//! Reduces a plotted series to min / max / mean so a run can be compared at a glance
//! without opening every CSV.

use crate::analysis::Point;

/// Statistics summary for a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

/// Computes min, max, mean in one pass; `None` for no values.
pub fn calculate_stats<I>(data: I) -> Option<Stats>
where
    I: IntoIterator<Item = f64>,
{
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for x in data {
        count += 1;
        sum += x;
        min = min.min(x);
        max = max.max(x);
    }
    if count == 0 {
        return None;
    }
    Some(Stats {
        min,
        max,
        mean: sum / count as f64,
        count,
    })
}

/// Stats of a series' y values.
#[inline]
pub fn y_stats(points: &[Point]) -> Option<Stats> {
    calculate_stats(points.iter().map(|p| p.y))
}

/// Total points across simulated trajectories.
pub fn trajectory_points(trajectories: &[Vec<Point>]) -> usize {
    trajectories.iter().map(Vec::len).sum()
}
