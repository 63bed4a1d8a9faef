//! Noise reduction for recorded velocity.
//!
//! Trailing moving average over each test; the window never reaches back across a
//! test start.

use std::collections::VecDeque;

use crate::data::sample::{RawSample, TestBoundaries};

/// Replaces each row's velocity with the mean of the last `window` velocities of
/// its test. A window of 0 or 1 returns the rows unchanged.
pub fn moving_average(rows: &[RawSample], window: usize, boundaries: &TestBoundaries) -> Vec<RawSample> {
    if window <= 1 {
        return rows.to_vec();
    }

    let mut buf: VecDeque<f64> = VecDeque::with_capacity(window + 1);
    let mut sum = 0.0;
    rows.iter()
        .map(|r| {
            if boundaries.contains(r.timestamp) {
                buf.clear();
                sum = 0.0;
            }
            buf.push_back(r.velocity);
            sum += r.velocity;
            if buf.len() > window {
                sum -= buf.pop_front().unwrap_or(0.0);
            }
            RawSample {
                velocity: sum / buf.len() as f64,
                ..*r
            }
        })
        .collect()
}
