//! plot_data.rs
//! Full analysis pass and the shared state a presentation layer reads.
//!
//! WRITER: one pass at a time builds a complete [`PlotData`] off to the side, then
//! swaps it in under the mutex. Readers never see a half-written pass.
//!
//! READER: [`AnalyzerPlot::try_view`] never blocks. On contention it returns `None`
//! and the caller skips that frame.
//!
//! CANCELLATION: the flag is polled on every iteration of every O(n) loop. A
//! cancelled pass is dropped before the swap, leaving the last committed state.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::analysis::decomposer::{acceleration_portion, velocity_portion};
use crate::analysis::fit_lines::{FitLine, acceleration_fit_line, velocity_fit_line};
use crate::analysis::fit_quality::{FitAccumulator, FitMetrics, simulate_time_domain};
use crate::analysis::timing::{interval_point, mean_dt_line};
use crate::analysis::{PassOutcome, Point, is_cancelled, resampler};
use crate::config::{MAX_POINTS, unit_abbreviation};
use crate::data::{Storage, TestBoundaries};
use crate::error::Result;
use crate::model::{AnalysisKind, FeedforwardGains, build_sim};

/// The seven named output series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKind {
    /// Slow velocity against its velocity-portion voltage.
    VelocityFit,
    /// Fast acceleration against its acceleration-portion voltage.
    AccelerationFit,
    QuasistaticVelocity,
    QuasistaticAcceleration,
    DynamicVelocity,
    DynamicAcceleration,
    /// Sample interval in milliseconds against time.
    SampleInterval,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 7] = [
        SeriesKind::VelocityFit,
        SeriesKind::AccelerationFit,
        SeriesKind::QuasistaticVelocity,
        SeriesKind::QuasistaticAcceleration,
        SeriesKind::DynamicVelocity,
        SeriesKind::DynamicAcceleration,
        SeriesKind::SampleInterval,
    ];

    /// Series that also exist for the unfiltered capture.
    pub const TIME_DOMAIN: [SeriesKind; 4] = [
        SeriesKind::QuasistaticVelocity,
        SeriesKind::QuasistaticAcceleration,
        SeriesKind::DynamicVelocity,
        SeriesKind::DynamicAcceleration,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SeriesKind::VelocityFit => "Quasistatic Velocity vs. Velocity-Portion Voltage",
            SeriesKind::AccelerationFit => "Dynamic Acceleration vs. Acceleration-Portion Voltage",
            SeriesKind::QuasistaticVelocity => "Quasistatic Velocity vs. Time",
            SeriesKind::QuasistaticAcceleration => "Quasistatic Acceleration vs. Time",
            SeriesKind::DynamicVelocity => "Dynamic Velocity vs. Time",
            SeriesKind::DynamicAcceleration => "Dynamic Acceleration vs. Time",
            SeriesKind::SampleInterval => "Timesteps vs. Time",
        }
    }

    /// File name stem used when exporting.
    pub fn file_stem(&self) -> &'static str {
        match self {
            SeriesKind::VelocityFit => "velocity_fit",
            SeriesKind::AccelerationFit => "acceleration_fit",
            SeriesKind::QuasistaticVelocity => "quasistatic_velocity",
            SeriesKind::QuasistaticAcceleration => "quasistatic_acceleration",
            SeriesKind::DynamicVelocity => "dynamic_velocity",
            SeriesKind::DynamicAcceleration => "dynamic_acceleration",
            SeriesKind::SampleInterval => "sample_interval",
        }
    }
}

/// Everything one analysis pass produces.
///
/// Replaced wholesale by each committed pass; never edited in place from outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotData {
    filtered: BTreeMap<SeriesKind, Vec<Point>>,
    raw: BTreeMap<SeriesKind, Vec<Point>>,
    kv_fit: FitLine,
    ka_fit: FitLine,
    dt_mean_line: Vec<Point>,
    quasistatic_sim: Vec<Vec<Point>>,
    dynamic_sim: Vec<Vec<Point>>,
    fit: FitAccumulator,
    velocity_label: String,
    acceleration_label: String,
}

impl PlotData {
    fn labelled(unit: &str) -> Self {
        let abbr = unit_abbreviation(unit);
        Self {
            velocity_label: format!("Velocity ({} / s)", abbr),
            acceleration_label: format!("Acceleration ({} / s^2)", abbr),
            ..Default::default()
        }
    }

    fn push(&mut self, kind: SeriesKind, p: Point) {
        self.filtered.entry(kind).or_default().push(p);
    }

    /// Filtered series; empty if the pass produced none.
    pub fn series(&self, kind: SeriesKind) -> &[Point] {
        self.filtered.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Unfiltered time-domain series; only [`SeriesKind::TIME_DOMAIN`] are ever filled.
    pub fn raw_series(&self, kind: SeriesKind) -> &[Point] {
        self.raw.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn kv_fit(&self) -> &FitLine {
        &self.kv_fit
    }

    pub fn ka_fit(&self) -> &FitLine {
        &self.ka_fit
    }

    pub fn dt_mean_line(&self) -> &[Point] {
        &self.dt_mean_line
    }

    /// Simulated slow-test velocity, one trajectory per test run.
    pub fn quasistatic_sim(&self) -> &[Vec<Point>] {
        &self.quasistatic_sim
    }

    /// Simulated fast-test velocity, one trajectory per test run.
    pub fn dynamic_sim(&self) -> &[Vec<Point>] {
        &self.dynamic_sim
    }

    /// RMSE and R² of the last committed pass.
    ///
    /// `InsufficientData` after a reset or a pass that had nothing to score.
    pub fn metrics(&self) -> Result<FitMetrics> {
        self.fit.metrics()
    }

    pub fn velocity_label(&self) -> &str {
        &self.velocity_label
    }

    pub fn acceleration_label(&self) -> &str {
        &self.acceleration_label
    }

    /// True when no series, line or trajectory holds a point.
    pub fn is_empty(&self) -> bool {
        self.filtered.values().all(Vec::is_empty)
            && self.raw.values().all(Vec::is_empty)
            && self.dt_mean_line.is_empty()
            && self.quasistatic_sim.is_empty()
            && self.dynamic_sim.is_empty()
            && self.fit.points() == 0
    }
}

/// Inputs of a full analysis pass.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    /// Unfiltered capture; drives the simulation and the raw series.
    pub raw: &'a Storage,
    /// Filtered capture; drives decomposition and the filtered series.
    pub filtered: &'a Storage,
    /// Measurement unit, for axis labels only.
    pub unit: &'a str,
    /// `[Ks, Kv, Ka]` plus `Kg` or `Kcos`.
    pub gains: &'a [f64],
    /// The four test start timestamps.
    pub start_times: &'a [f64],
    pub kind: AnalysisKind,
}

/// Shared analysis results: one writer, any number of non-blocking readers.
#[derive(Debug, Default)]
pub struct AnalyzerPlot {
    state: Mutex<PlotData>,
}

impl AnalyzerPlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every series, line, trajectory and metric.
    pub fn reset_data(&self) {
        *self.state.lock() = PlotData::default();
    }

    /// Replaces the state with the raw time-domain series of `raw` only.
    pub fn set_raw_data(&self, raw: &Storage, unit: &str, cancel: &AtomicBool) -> Result<PassOutcome> {
        raw.validate(("raw slow", "raw fast"))
            .inspect_err(|e| warn!("Rejected raw data: {}", e))?;

        let mut data = PlotData::labelled(unit);
        if !fill_raw_series(&mut data, raw, cancel) {
            info!("Raw data pass cancelled; keeping previous results");
            return Ok(PassOutcome::Cancelled);
        }
        *self.state.lock() = data;
        Ok(PassOutcome::Committed)
    }

    /// Runs a full analysis pass and commits it unless cancelled.
    ///
    /// Malformed input is rejected before any work and leaves the state untouched.
    pub fn set_data(&self, req: &AnalysisRequest<'_>, cancel: &AtomicBool) -> Result<PassOutcome> {
        let Some(data) = analyze(req, cancel).inspect_err(|e| warn!("Analysis failed: {}", e))? else {
            info!("Analysis pass cancelled; keeping previous results");
            return Ok(PassOutcome::Cancelled);
        };

        match data.metrics() {
            Ok(m) => info!("Committed analysis: RMSE = {:.6}, R² = {:.6}", m.rmse, m.r_squared),
            Err(e) => warn!("Committed analysis without fit metrics: {}", e),
        }
        *self.state.lock() = data;
        Ok(PassOutcome::Committed)
    }

    /// Runs `f` on the current state if the lock is free, otherwise `None`.
    pub fn try_view<R>(&self, f: impl FnOnce(&PlotData) -> R) -> Option<R> {
        self.state.try_lock().map(|guard| f(&*guard))
    }

    /// Blocking copy of the current state.
    pub fn snapshot(&self) -> PlotData {
        self.state.lock().clone()
    }
}

/// Builds a complete [`PlotData`]; `Ok(None)` if cancelled.
fn analyze(req: &AnalysisRequest<'_>, cancel: &AtomicBool) -> Result<Option<PlotData>> {
    // ========================================================================
    // Validation: nothing is computed for malformed input
    // ========================================================================
    req.filtered.validate(("slow", "fast"))?;
    req.raw.validate(("raw slow", "raw fast"))?;
    let gains = FeedforwardGains::from_slice(req.kind, req.gains)?;
    let boundaries = TestBoundaries::from_slice(req.start_times)?;

    info!(
        "Analyzing {} data: {} slow / {} fast samples ({} / {} raw)",
        req.kind,
        req.filtered.slow.len(),
        req.filtered.fast.len(),
        req.raw.slow.len(),
        req.raw.fast.len()
    );

    let mut data = PlotData::labelled(req.unit);
    let Storage { slow, fast } = req.filtered;

    // ========================================================================
    // Voltage domain and filtered time domain
    // ========================================================================
    debug!(
        "Filtered strides: slow {}, fast {}",
        resampler::stride(slow.len(), MAX_POINTS),
        resampler::stride(fast.len(), MAX_POINTS)
    );
    let groups = [(slow.as_slice(), true), (fast.as_slice(), false)];
    for (group, quasistatic) in groups {
        for i in resampler::indices(group.len(), MAX_POINTS) {
            if is_cancelled(cancel) {
                return Ok(None);
            }
            let s = &group[i];
            if quasistatic {
                data.push(SeriesKind::VelocityFit, Point::new(velocity_portion(&gains, s), s.velocity));
                data.push(SeriesKind::QuasistaticVelocity, Point::new(s.timestamp, s.velocity));
                data.push(SeriesKind::QuasistaticAcceleration, Point::new(s.timestamp, s.acceleration));
            } else {
                data.push(
                    SeriesKind::AccelerationFit,
                    Point::new(acceleration_portion(&gains, s), s.acceleration),
                );
                data.push(SeriesKind::DynamicVelocity, Point::new(s.timestamp, s.velocity));
                data.push(SeriesKind::DynamicAcceleration, Point::new(s.timestamp, s.acceleration));
            }
            if let Some(p) = interval_point(i, s, &boundaries) {
                data.push(SeriesKind::SampleInterval, p);
            }
        }
    }

    data.kv_fit = velocity_fit_line(gains.kv, slow).unwrap_or_default();
    data.ka_fit = acceleration_fit_line(gains.ka, fast).unwrap_or_default();
    data.dt_mean_line = mean_dt_line(req.filtered);

    // ========================================================================
    // Raw time domain
    // ========================================================================
    if !fill_raw_series(&mut data, req.raw, cancel) {
        return Ok(None);
    }

    // ========================================================================
    // Simulation and fit quality, over the raw capture
    // ========================================================================
    let mut sim = build_sim(&gains);
    let mut acc = FitAccumulator::new();
    let Some(quasistatic) = simulate_time_domain(&req.raw.slow, &boundaries, sim.as_mut(), &mut acc, cancel)?
    else {
        return Ok(None);
    };
    let Some(dynamic) = simulate_time_domain(&req.raw.fast, &boundaries, sim.as_mut(), &mut acc, cancel)?
    else {
        return Ok(None);
    };
    data.quasistatic_sim = quasistatic;
    data.dynamic_sim = dynamic;
    data.fit = acc;

    Ok(Some(data))
}

/// Fills the raw time-domain series; false if cancelled.
fn fill_raw_series(data: &mut PlotData, raw: &Storage, cancel: &AtomicBool) -> bool {
    let groups = [
        (&raw.slow, SeriesKind::QuasistaticVelocity, SeriesKind::QuasistaticAcceleration),
        (&raw.fast, SeriesKind::DynamicVelocity, SeriesKind::DynamicAcceleration),
    ];
    for (group, velocity, acceleration) in groups {
        debug!("Raw stride {} over {} samples", resampler::stride(group.len(), MAX_POINTS), group.len());
        for i in resampler::indices(group.len(), MAX_POINTS) {
            if is_cancelled(cancel) {
                return false;
            }
            let s = &group[i];
            data.raw.entry(velocity).or_default().push(Point::new(s.timestamp, s.velocity));
            data.raw
                .entry(acceleration)
                .or_default()
                .push(Point::new(s.timestamp, s.acceleration));
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawSample, prepare};
    use crate::error::AnalysisError;

    const STARTS: [f64; 4] = [0.0, 10.0, 20.0, 30.0];

    /// Two 2 s tests per group: slow at t = 0 and 10, fast at t = 20 and 30.
    fn storage(per_test: usize) -> Storage {
        let b = TestBoundaries::new(STARTS);
        let h = 2.0 / per_test as f64;
        let run = |t0: f64, dir: f64, accel: f64| -> Vec<RawSample> {
            (0..per_test)
                .map(|i| {
                    let t = i as f64 * h;
                    RawSample {
                        timestamp: t0 + t,
                        voltage: dir * (1.0 + accel * t),
                        position: 0.0,
                        velocity: dir * (0.5 + accel * t),
                    }
                })
                .collect()
        };
        let slow: Vec<RawSample> = [run(0.0, 1.0, 0.5), run(10.0, -1.0, 0.5)].concat();
        let fast: Vec<RawSample> = [run(20.0, 1.0, 20.0), run(30.0, -1.0, 20.0)].concat();
        Storage::new(
            prepare(&slow, AnalysisKind::SimpleMotor, &b),
            prepare(&fast, AnalysisKind::SimpleMotor, &b),
        )
    }

    fn request<'a>(data: &'a Storage, gains: &'a [f64], starts: &'a [f64]) -> AnalysisRequest<'a> {
        AnalysisRequest {
            raw: data,
            filtered: data,
            unit: "Meters",
            gains,
            start_times: starts,
            kind: AnalysisKind::SimpleMotor,
        }
    }

    #[test]
    fn reset_reads_as_insufficient_data() {
        let plot = AnalyzerPlot::new();
        let data = storage(50);
        let cancel = AtomicBool::new(false);
        plot.set_data(&request(&data, &[0.1, 1.0, 0.2], &STARTS), &cancel).unwrap();
        assert!(plot.snapshot().metrics().is_ok());

        plot.reset_data();
        let view = plot.snapshot();
        assert!(view.is_empty());
        assert!(matches!(view.metrics(), Err(AnalysisError::InsufficientData)));
        assert_eq!(view.kv_fit(), &[Point::default(); 2]);
    }

    #[test]
    fn full_pass_fills_every_output() {
        let plot = AnalyzerPlot::new();
        let data = storage(50);
        let cancel = AtomicBool::new(false);
        let outcome = plot.set_data(&request(&data, &[0.1, 1.0, 0.2], &STARTS), &cancel).unwrap();
        assert_eq!(outcome, PassOutcome::Committed);

        let view = plot.snapshot();
        for kind in SeriesKind::ALL {
            assert!(!view.series(kind).is_empty(), "{:?} empty", kind);
        }
        for kind in SeriesKind::TIME_DOMAIN {
            assert_eq!(view.raw_series(kind).len(), 100);
        }
        assert!(view.raw_series(SeriesKind::VelocityFit).is_empty());
        assert_eq!(view.velocity_label(), "Velocity (m / s)");
        assert_eq!(view.acceleration_label(), "Acceleration (m / s^2)");
        assert_eq!(view.quasistatic_sim().len(), 2);
        assert_eq!(view.dynamic_sim().len(), 2);
        assert_eq!(view.dt_mean_line().len(), 2);
        // test starts and last samples carry no interval
        assert_eq!(view.series(SeriesKind::SampleInterval).len(), 4 * 48);
        assert!(view.metrics().unwrap().rmse >= 0.0);
    }

    #[test]
    fn long_captures_are_decimated() {
        let plot = AnalyzerPlot::new();
        let data = storage(5000);
        let cancel = AtomicBool::new(false);
        plot.set_data(&request(&data, &[0.1, 1.0, 0.2], &STARTS), &cancel).unwrap();
        let view = plot.snapshot();
        // 10 000 samples per group, stride 20
        assert_eq!(view.series(SeriesKind::QuasistaticVelocity).len(), 500);
        assert_eq!(view.raw_series(SeriesKind::DynamicAcceleration).len(), 500);
        // simulation is not decimated
        assert_eq!(view.quasistatic_sim()[0].len(), 5000);
    }

    #[test]
    fn malformed_input_leaves_state_untouched() {
        let plot = AnalyzerPlot::new();
        let data = storage(20);
        let cancel = AtomicBool::new(false);
        plot.set_data(&request(&data, &[0.1, 1.0, 0.2], &STARTS), &cancel).unwrap();
        let before = plot.snapshot();

        let err = plot
            .set_data(&request(&data, &[0.1, 1.0, 0.2, 0.3], &STARTS), &cancel)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::GainCount { expected: 3, got: 4, .. }));
        assert!(err.is_malformed_input());

        let err = plot
            .set_data(&request(&data, &[0.1, 1.0, 0.2], &STARTS[..3]), &cancel)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::BoundaryCount { got: 3 }));

        let empty = Storage::new(Vec::new(), data.fast.clone());
        let err = plot
            .set_data(&request(&empty, &[0.1, 1.0, 0.2], &STARTS), &cancel)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset { group: "slow" }));

        assert_eq!(plot.snapshot(), before);
    }

    #[test]
    fn cancelled_pass_keeps_previous_results() {
        let plot = AnalyzerPlot::new();
        let data = storage(20);
        let idle = AtomicBool::new(false);
        plot.set_data(&request(&data, &[0.1, 1.0, 0.2], &STARTS), &idle).unwrap();
        let before = plot.snapshot();

        let other = storage(40);
        let cancel = AtomicBool::new(true);
        let outcome = plot.set_data(&request(&other, &[0.3, 2.0, 0.4], &STARTS), &cancel).unwrap();
        assert_eq!(outcome, PassOutcome::Cancelled);
        assert_eq!(plot.snapshot(), before);

        let outcome = plot.set_raw_data(&other, "Feet", &cancel).unwrap();
        assert_eq!(outcome, PassOutcome::Cancelled);
        assert_eq!(plot.snapshot(), before);
    }

    #[test]
    fn raw_pass_fills_raw_series_only() {
        let plot = AnalyzerPlot::new();
        let data = storage(10);
        let cancel = AtomicBool::new(false);
        plot.set_data(&request(&data, &[0.1, 1.0, 0.2], &STARTS), &cancel).unwrap();
        plot.set_raw_data(&data, "Rotations", &cancel).unwrap();

        let view = plot.snapshot();
        assert_eq!(view.raw_series(SeriesKind::QuasistaticVelocity).len(), 20);
        assert!(view.series(SeriesKind::VelocityFit).is_empty());
        assert!(view.quasistatic_sim().is_empty());
        assert!(matches!(view.metrics(), Err(AnalysisError::InsufficientData)));
        assert_eq!(view.velocity_label(), "Velocity (rot / s)");
    }

    #[test]
    fn reader_skips_while_writer_holds_lock() {
        let plot = AnalyzerPlot::new();
        {
            let _writer = plot.state.lock();
            assert!(plot.try_view(|d| d.is_empty()).is_none());
        }
        assert_eq!(plot.try_view(|d| d.is_empty()), Some(true));
    }
}
