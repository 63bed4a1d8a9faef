//! Fit quality: re-simulate the recorded tests from the gains and score the result.
//!
//! For every consecutive pair `(previous, current)` inside one test run the model is
//! advanced by `previous.voltage` for `previous.dt`, then compared with
//! `current.velocity`:
//!
//! ```text
//! RMSE = sqrt(Σ(v − v̂)² / N)
//! R²   = 1 − RMSE / sqrt(Σv² / N)
//! ```
//!
//! Accumulators belong to one analysis pass; nothing is shared between passes.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use serde::Serialize;

use crate::analysis::{Point, segmenter::segments};
use crate::data::{Sample, TestBoundaries};
use crate::error::{AnalysisError, Result};
use crate::model::ActuatorSim;

/// Scores of one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitMetrics {
    /// Root-mean-square velocity error, in velocity units.
    pub rmse: f64,
    /// Coefficient of determination; 1 is a perfect fit, negative is worse than the mean.
    pub r_squared: f64,
}

/// Running sums for RMSE / R².
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitAccumulator {
    squared_error_sum: f64,
    squared_variation_sum: f64,
    points: usize,
}

impl FitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, measured: f64, simulated: f64) {
        self.squared_error_sum += (measured - simulated).powi(2);
        self.squared_variation_sum += measured.powi(2);
        self.points += 1;
    }

    pub fn points(&self) -> usize {
        self.points
    }

    /// Final scores. Fails with [`AnalysisError::InsufficientData`] when nothing was
    /// recorded and [`AnalysisError::ZeroVariance`] when every measured velocity was 0.
    pub fn metrics(&self) -> Result<FitMetrics> {
        if self.points == 0 {
            return Err(AnalysisError::InsufficientData);
        }
        let n = self.points as f64;
        let rmse = (self.squared_error_sum / n).sqrt();
        let rms_velocity = (self.squared_variation_sum / n).sqrt();
        if rms_velocity == 0.0 {
            return Err(AnalysisError::ZeroVariance);
        }
        Ok(FitMetrics {
            rmse,
            r_squared: 1.0 - rmse / rms_velocity,
        })
    }
}

/// Simulates every test run in `data`, recording errors into `acc`.
///
/// Returns one trajectory per run: the run's first recorded point followed by the
/// simulated velocity at each later timestamp. `Ok(None)` if `cancel` was raised,
/// in which case `acc` holds a partial sum and must be discarded.
pub fn simulate_time_domain(
    data: &[Sample],
    boundaries: &TestBoundaries,
    sim: &mut dyn ActuatorSim,
    acc: &mut FitAccumulator,
    cancel: &AtomicBool,
) -> Result<Option<Vec<Vec<Point>>>> {
    let mut trajectories = Vec::new();

    for run in segments(data, boundaries) {
        let first = &run[0];
        sim.reset(first.position, first.velocity);

        let mut pts = Vec::with_capacity(run.len());
        pts.push(Point::new(first.timestamp, first.velocity));

        for pair in run.windows(2) {
            if cancel.load(Ordering::Relaxed) {
                return Ok(None);
            }
            let (pre, now) = (&pair[0], &pair[1]);
            sim.update(pre.voltage, pre.dt)?;
            pts.push(Point::new(now.timestamp, sim.velocity()));
            acc.record(now.velocity, sim.velocity());
        }

        trajectories.push(pts);
    }

    debug!(
        "Simulated {} test runs, {} scored points so far",
        trajectories.len(),
        acc.points()
    );
    Ok(Some(trajectories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimpleMotorSim;

    /// Capture whose velocities come from the simulator itself.
    fn self_consistent(voltages: &[f64], dt: f64) -> Vec<Sample> {
        let mut sim = SimpleMotorSim::new(0.2, 1.5, 0.3);
        sim.reset(0.0, 0.0);
        let mut out = Vec::new();
        for (i, &v) in voltages.iter().enumerate() {
            let mut s = Sample::new(i as f64 * dt, v, sim.position(), sim.velocity());
            s.dt = dt;
            out.push(s);
            sim.update(v, dt).unwrap();
        }
        out
    }

    #[test]
    fn empty_accumulator_is_insufficient() {
        assert!(matches!(FitAccumulator::new().metrics(), Err(AnalysisError::InsufficientData)));
    }

    #[test]
    fn all_zero_velocity_is_zero_variance() {
        let mut acc = FitAccumulator::new();
        acc.record(0.0, 0.3);
        assert!(matches!(acc.metrics(), Err(AnalysisError::ZeroVariance)));
    }

    #[test]
    fn rmse_and_r_squared_by_hand() {
        let mut acc = FitAccumulator::new();
        acc.record(3.0, 2.0);
        acc.record(-4.0, -4.0);
        let m = acc.metrics().unwrap();
        let rmse = (0.5f64).sqrt();
        assert!((m.rmse - rmse).abs() < 1e-12);
        assert!((m.r_squared - (1.0 - rmse / 12.5f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn perfect_model_scores_one() {
        let data = self_consistent(&[6.0, 6.0, 6.0, 3.0, -2.0, -6.0, 0.0, 4.0], 0.01);
        let b = TestBoundaries::new([0.0, 100.0, 200.0, 300.0]);
        let mut sim = SimpleMotorSim::new(0.2, 1.5, 0.3);
        let mut acc = FitAccumulator::new();
        let cancel = AtomicBool::new(false);

        let traj = simulate_time_domain(&data, &b, &mut sim, &mut acc, &cancel)
            .unwrap()
            .unwrap();
        assert_eq!(traj.len(), 1);
        assert_eq!(traj[0].len(), data.len());
        assert_eq!(acc.points(), data.len() - 1);

        let m = acc.metrics().unwrap();
        assert!(m.rmse >= 0.0);
        assert!(m.rmse < 1e-12);
        assert!((m.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn boundary_resets_and_is_not_scored() {
        let mut data = self_consistent(&[6.0, 6.0, 6.0], 0.01);
        // second test starts at t = 1.0 from rest
        let mut restart = Sample::new(1.0, 6.0, 0.0, 0.0);
        restart.dt = 0.01;
        data.push(restart);
        let mut sim_ref = SimpleMotorSim::new(0.2, 1.5, 0.3);
        sim_ref.reset(0.0, 0.0);
        sim_ref.update(6.0, 0.01).unwrap();
        data.push(Sample::new(1.01, 6.0, 0.0, sim_ref.velocity()));

        let b = TestBoundaries::new([0.0, 1.0, 200.0, 300.0]);
        let mut sim = SimpleMotorSim::new(0.2, 1.5, 0.3);
        let mut acc = FitAccumulator::new();
        let cancel = AtomicBool::new(false);
        let traj = simulate_time_domain(&data, &b, &mut sim, &mut acc, &cancel)
            .unwrap()
            .unwrap();

        assert_eq!(traj.len(), 2);
        assert_eq!(traj[1][0], Point::new(1.0, 0.0));
        // 2 pairs in the first run, 1 in the second
        assert_eq!(acc.points(), 3);
        assert!(acc.metrics().unwrap().rmse < 1e-12);
    }

    #[test]
    fn cancellation_stops_early() {
        let data = self_consistent(&[1.0; 16], 0.01);
        let b = TestBoundaries::new([0.0, 100.0, 200.0, 300.0]);
        let mut sim = SimpleMotorSim::new(0.2, 1.5, 0.3);
        let mut acc = FitAccumulator::new();
        let cancel = AtomicBool::new(true);
        let out = simulate_time_domain(&data, &b, &mut sim, &mut acc, &cancel).unwrap();
        assert!(out.is_none());
        assert_eq!(acc.points(), 0);
    }
}
