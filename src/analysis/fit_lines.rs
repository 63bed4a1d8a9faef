//! Best-fit line segments implied by the gains.
//!
//! Each line runs between the smallest and largest observed rate, placed at the
//! voltage portion `K·rate` the gains predict for it.

use statrs::statistics::Statistics;

use crate::analysis::Point;
use crate::data::Sample;

/// Two-point line segment.
pub type FitLine = [Point; 2];

/// Line through `(k·min, min)` and `(k·max, max)` of `rate` over `data`.
///
/// `None` for empty data. A single sample gives a zero-length line.
pub fn fit_line<F>(k: f64, data: &[Sample], rate: F) -> Option<FitLine>
where
    F: Fn(&Sample) -> f64,
{
    if data.is_empty() {
        return None;
    }
    let values: Vec<f64> = data.iter().map(rate).collect();
    let min = Statistics::min(values.iter());
    let max = Statistics::max(values.iter());
    Some([Point::new(k * min, min), Point::new(k * max, max)])
}

/// `Kv` line over the slow dataset's velocities.
pub fn velocity_fit_line(kv: f64, slow: &[Sample]) -> Option<FitLine> {
    fit_line(kv, slow, |s| s.velocity)
}

/// `Ka` line over the fast dataset's accelerations.
pub fn acceleration_fit_line(ka: f64, fast: &[Sample]) -> Option<FitLine> {
    fit_line(ka, fast, |s| s.acceleration)
}
