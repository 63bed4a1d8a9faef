//! CSV ingestion for recorded captures.
//!
//! Files carry a header row `timestamp,voltage,position,velocity`. A capture file may
//! hold several tests back to back; a test ends wherever the timestamp steps backwards
//! or jumps by more than [`MAX_VALID_DT_SECS`], and the first row of each test is a
//! start boundary.

use std::{fs::File, io::Read, path::Path};

use csv::ReaderBuilder;
use log::{debug, info};

use crate::config::MAX_VALID_DT_SECS;
use crate::data::sample::RawSample;
use crate::error::{AnalysisError, Result};

/// Reads every row of a capture CSV.
pub fn read_raw_csv(path: &Path) -> Result<Vec<RawSample>> {
    let file = File::open(path)?;
    let rows = read_raw_from(file)?;
    info!("Loaded {} samples from {:?}", rows.len(), path);
    Ok(rows)
}

/// Same as [`read_raw_csv`] over any reader.
pub fn read_raw_from<R: Read>(reader: R) -> Result<Vec<RawSample>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        let row: RawSample = record?;
        rows.push(row);
    }
    Ok(rows)
}

/// Splits a capture into its individual tests.
pub fn split_tests(rows: &[RawSample]) -> Vec<&[RawSample]> {
    let mut tests = Vec::new();
    let mut start = 0;
    for i in 1..rows.len() {
        let gap = rows[i].timestamp - rows[i - 1].timestamp;
        if gap < 0.0 || gap > MAX_VALID_DT_SECS {
            tests.push(&rows[start..i]);
            start = i;
        }
    }
    if start < rows.len() {
        tests.push(&rows[start..]);
    }
    debug!("Capture split into {} tests", tests.len());
    tests
}

/// Loads a slow and a fast capture, each of which must contain exactly two tests
/// (forward then backward), and returns both captures plus the four test starts in
/// slow-forward, slow-backward, fast-forward, fast-backward order.
pub fn load_capture_pair(slow: &Path, fast: &Path) -> Result<(Vec<RawSample>, Vec<RawSample>, [f64; 4])> {
    let slow_rows = read_raw_csv(slow)?;
    let fast_rows = read_raw_csv(fast)?;

    let slow_tests = split_tests(&slow_rows);
    let fast_tests = split_tests(&fast_rows);
    if slow_tests.len() != 2 || fast_tests.len() != 2 {
        return Err(AnalysisError::InvalidInput(format!(
            "expected 2 slow and 2 fast tests, found {} and {}",
            slow_tests.len(),
            fast_tests.len()
        )));
    }

    let starts = [
        slow_tests[0][0].timestamp,
        slow_tests[1][0].timestamp,
        fast_tests[0][0].timestamp,
        fast_tests[1][0].timestamp,
    ];

    Ok((slow_rows, fast_rows, starts))
}
