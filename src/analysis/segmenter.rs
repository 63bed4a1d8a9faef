//! segmenter.rs
//! Splits a concatenated capture into independent test runs.
//!
//! A run ends just before any sample whose timestamp is exactly one of the test
//! starts; that sample opens the next run. The very first sample always opens the
//! first run, boundary or not.
//!
//! Matching is exact. A start time that is off from the recorded timestamp by
//! floating point round-off (a single ULP is enough) never splits the capture. Long
//! captures whose timestamps were accumulated rather than recorded are exposed to this.

use crate::data::{Sample, TestBoundaries};

/// Iterator over the contiguous runs of a capture.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: &'a [Sample],
    boundaries: TestBoundaries,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a [Sample];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest[1..]
            .iter()
            .position(|s| self.boundaries.contains(s.timestamp))
            .map(|p| p + 1)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(run)
    }
}

/// Lazily segments `samples` at `boundaries`.
pub fn segments<'a>(samples: &'a [Sample], boundaries: &TestBoundaries) -> Segments<'a> {
    Segments {
        rest: samples,
        boundaries: *boundaries,
    }
}
