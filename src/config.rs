//! Tuning constants and command-line run configuration.
//!
//! The analysis core is driven by a handful of named constants; the binary
//! layers a [`RunConfig`] on top, parsed from `std::env::args`.

use std::{path::PathBuf, str::FromStr};

use crate::error::{AnalysisError, Result};
use crate::model::AnalysisKind;

/// Point budget shared by the derived series drawn from one dataset.
pub const MAX_POINTS: usize = 2048;

/// Number of series drawn from each dataset; the budget is split between them.
pub const SERIES_PER_DATASET: usize = 4;

/// Sample intervals at or above this are treated as capture gaps when averaging.
pub const MAX_VALID_DT_SECS: f64 = 0.5;

/// Number of test start timestamps a capture provides.
pub const TEST_BOUNDARY_COUNT: usize = 4;

/// Trailing moving-average window applied to velocity for the filtered storage.
pub const DEFAULT_FILTER_WINDOW: usize = 5;

pub const DEFAULT_EXPORT_DIR: &str = "data/sysid_results";
pub const DEFAULT_UNIT: &str = "Meters";

/// Known measurement units and their axis abbreviations.
const UNIT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Meters", "m"),
    ("Feet", "ft"),
    ("Inches", "in"),
    ("Radians", "rad"),
    ("Rotations", "rot"),
    ("Degrees", "deg"),
];

/// Abbreviation for a unit label; unknown units pass through unchanged.
pub fn unit_abbreviation(unit: &str) -> &str {
    UNIT_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, abbr)| *abbr)
        .unwrap_or(unit)
}

/// Where the binary gets its samples from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// `slow.csv` and `fast.csv` recorded captures.
    Files { slow: PathBuf, fast: PathBuf },
    /// Forward-model data with measurement noise.
    Synthetic { noise: f64 },
}

/// Options for one run of the `sysid_analysis` binary.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub kind: AnalysisKind,
    pub unit: String,
    pub source: DataSource,
    /// Explicit gains; fitted from the data when absent.
    pub gains: Option<Vec<f64>>,
    pub filter_window: usize,
    pub export_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            kind: AnalysisKind::SimpleMotor,
            unit: DEFAULT_UNIT.to_string(),
            source: DataSource::Synthetic { noise: 0.02 },
            gains: None,
            filter_window: DEFAULT_FILTER_WINDOW,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}

impl RunConfig {
    /// Parses `--kind`, `--unit`, `--slow`, `--fast`, `--noise`, `--gains`, `--window`, `--out`.
    ///
    /// `--slow` and `--fast` must be given together. Anything not given keeps its default.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = RunConfig::default();
        let mut slow: Option<PathBuf> = None;
        let mut fast: Option<PathBuf> = None;

        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| AnalysisError::InvalidInput(format!("missing value for {}", flag)))
            };
            match flag.as_str() {
                "--kind" => cfg.kind = value()?.parse()?,
                "--unit" => cfg.unit = value()?,
                "--slow" => slow = Some(PathBuf::from(value()?)),
                "--fast" => fast = Some(PathBuf::from(value()?)),
                "--noise" => {
                    let raw = value()?;
                    let noise = raw
                        .parse::<f64>()
                        .map_err(|_| AnalysisError::InvalidInput(format!("bad noise level '{}'", raw)))?;
                    cfg.source = DataSource::Synthetic { noise };
                }
                "--gains" => cfg.gains = Some(parse_gains(&value()?)?),
                "--window" => {
                    let raw = value()?;
                    cfg.filter_window = raw
                        .parse::<usize>()
                        .map_err(|_| AnalysisError::InvalidInput(format!("bad filter window '{}'", raw)))?;
                }
                "--out" => cfg.export_dir = PathBuf::from(value()?),
                other => {
                    return Err(AnalysisError::InvalidInput(format!("unrecognized option '{}'", other)));
                }
            }
        }

        match (slow, fast) {
            (Some(slow), Some(fast)) => cfg.source = DataSource::Files { slow, fast },
            (None, None) => {}
            _ => {
                return Err(AnalysisError::InvalidInput(
                    "--slow and --fast must be given together".into(),
                ));
            }
        }

        Ok(cfg)
    }
}

/// Comma separated gains, e.g. `0.1,2.0,0.3`.
fn parse_gains(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|g| {
            g.trim()
                .parse::<f64>()
                .map_err(|_| AnalysisError::InvalidInput(format!("bad gain '{}'", g)))
        })
        .collect()
}

impl FromStr for AnalysisKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "simple" | "simple-motor" | "simple_motor" => Ok(AnalysisKind::SimpleMotor),
            "elevator" => Ok(AnalysisKind::Elevator),
            "arm" => Ok(AnalysisKind::Arm),
            other => Err(AnalysisError::InvalidInput(format!("unknown actuator kind '{}'", other))),
        }
    }
}
