//! sample.rs
//! Prepared characterization samples and the slow/fast storage they live in.
//!
//! Raw captures are `(timestamp, voltage, position, velocity)` rows. Preparation derives
//! the per-sample quantities the analysis needs (next velocity, dt, acceleration, cosine)
//! without ever differencing across a test start.

use serde::{Deserialize, Serialize};

use crate::config::TEST_BOUNDARY_COUNT;
use crate::error::{AnalysisError, Result};
use crate::model::AnalysisKind;

/// One raw measurement row as recorded by the characterization routine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: f64,
    pub voltage: f64,
    pub position: f64,
    pub velocity: f64,
}

/// One measured instant after preparation.
///
/// Equality is exact, field by field. Two samples differing by one ULP in any field
/// (timestamp included) are different samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Sample {
    /// Seconds, monotonic within a test.
    pub timestamp: f64,
    pub voltage: f64,
    pub position: f64,
    pub velocity: f64,
    /// Velocity of the following sample in the same test, 0 if none.
    pub next_velocity: f64,
    /// Seconds until the following sample in the same test, 0 if none.
    pub dt: f64,
    pub acceleration: f64,
    /// `cos(position)` for arm captures, 0 otherwise.
    pub cos: f64,
}

impl Sample {
    pub fn new(timestamp: f64, voltage: f64, position: f64, velocity: f64) -> Self {
        Self {
            timestamp,
            voltage,
            position,
            velocity,
            ..Default::default()
        }
    }
}

/// Slow (quasistatic) and fast (dynamic) sample groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Storage {
    pub slow: Vec<Sample>,
    pub fast: Vec<Sample>,
}

impl Storage {
    pub fn new(slow: Vec<Sample>, fast: Vec<Sample>) -> Self {
        Self { slow, fast }
    }

    /// Rejects a storage with an empty group; `names` label the slow and fast groups.
    pub fn validate(&self, names: (&'static str, &'static str)) -> Result<()> {
        if self.slow.is_empty() {
            return Err(AnalysisError::EmptyDataset { group: names.0 });
        }
        if self.fast.is_empty() {
            return Err(AnalysisError::EmptyDataset { group: names.1 });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slow.len() + self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slow.is_empty() && self.fast.is_empty()
    }

    /// Earliest and latest timestamps across both groups.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let first = [self.slow.first(), self.fast.first()];
        let last = [self.slow.last(), self.fast.last()];
        let min = first.iter().flatten().map(|s| s.timestamp).reduce(f64::min)?;
        let max = last.iter().flatten().map(|s| s.timestamp).reduce(f64::max)?;
        Some((min, max))
    }
}

/// Timestamps where an independent test run starts inside a concatenated capture.
///
/// Matching is exact `f64` equality. A boundary that differs from every recorded
/// timestamp, even by a single ULP, never matches. There is deliberately no tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestBoundaries([f64; TEST_BOUNDARY_COUNT]);

impl TestBoundaries {
    pub fn new(starts: [f64; TEST_BOUNDARY_COUNT]) -> Self {
        Self(starts)
    }

    /// Builds from a caller supplied list, which must hold exactly four timestamps.
    pub fn from_slice(starts: &[f64]) -> Result<Self> {
        let array: [f64; TEST_BOUNDARY_COUNT] = starts
            .try_into()
            .map_err(|_| AnalysisError::BoundaryCount { got: starts.len() })?;
        Ok(Self(array))
    }

    /// First timestamp of each of the four tests: slow forward, slow backward,
    /// fast forward, fast backward.
    pub fn from_tests(tests: &[&[RawSample]]) -> Result<Self> {
        let starts: Vec<f64> = tests
            .iter()
            .filter_map(|t| t.first().map(|s| s.timestamp))
            .collect();
        Self::from_slice(&starts)
    }

    #[inline]
    pub fn contains(&self, timestamp: f64) -> bool {
        self.0.iter().any(|&start| start == timestamp)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Derives next velocity, dt, acceleration and cosine for an ordered capture.
///
/// A sample immediately before a boundary has no successor in its test, so its
/// `dt`, `next_velocity` and `acceleration` stay 0, as do those of the last sample.
pub fn prepare(raw: &[RawSample], kind: AnalysisKind, boundaries: &TestBoundaries) -> Vec<Sample> {
    let mut out: Vec<Sample> = raw
        .iter()
        .map(|r| {
            let mut s = Sample::new(r.timestamp, r.voltage, r.position, r.velocity);
            if kind == AnalysisKind::Arm {
                s.cos = r.position.cos();
            }
            s
        })
        .collect();

    for i in 0..out.len().saturating_sub(1) {
        let next = out[i + 1];
        if boundaries.contains(next.timestamp) {
            continue;
        }
        let cur = &mut out[i];
        cur.next_velocity = next.velocity;
        cur.dt = next.timestamp - cur.timestamp;
        if cur.dt > 0.0 {
            cur.acceleration = (cur.next_velocity - cur.velocity) / cur.dt;
        }
    }

    out
}
