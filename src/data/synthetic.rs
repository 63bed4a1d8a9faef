//! Synthetic characterization captures.
//!
//! Runs the forward model through the usual four-test routine (slow ramp forward and
//! backward, fast step forward and backward) and adds uniform measurement noise to
//! the recorded velocity. Useful for trying the analysis without hardware.

use rand::Rng;

use crate::data::sample::RawSample;
use crate::error::Result;
use crate::model::{FeedforwardGains, build_sim};

/// Capture period, seconds.
pub const SAMPLE_PERIOD_SECS: f64 = 0.005;
/// Quasistatic ramp rate, V/s.
pub const RAMP_RATE: f64 = 0.25;
/// Dynamic step voltage, V.
pub const STEP_VOLTAGE: f64 = 4.0;

const SLOW_TEST_SECS: f64 = 8.0;
const FAST_TEST_SECS: f64 = 2.0;
const TEST_STARTS: [f64; 4] = [0.0, 10.0, 20.0, 25.0];

/// Slow capture, fast capture and the four test starts.
pub type Capture = (Vec<RawSample>, Vec<RawSample>, [f64; 4]);

/// Generates both captures for `gains`; `noise` bounds the velocity error.
pub fn synthesize<R: Rng>(gains: &FeedforwardGains, noise: f64, rng: &mut R) -> Result<Capture> {
    let [slow_fwd, slow_back, fast_fwd, fast_back] = TEST_STARTS;

    let mut slow = run_test(gains, slow_fwd, SLOW_TEST_SECS, |t| RAMP_RATE * t, noise, rng)?;
    slow.extend(run_test(gains, slow_back, SLOW_TEST_SECS, |t| -RAMP_RATE * t, noise, rng)?);

    let mut fast = run_test(gains, fast_fwd, FAST_TEST_SECS, |_| STEP_VOLTAGE, noise, rng)?;
    fast.extend(run_test(gains, fast_back, FAST_TEST_SECS, |_| -STEP_VOLTAGE, noise, rng)?);

    Ok((slow, fast, TEST_STARTS))
}

/// One test from rest at the origin; `voltage` maps time since start to volts.
fn run_test<R, F>(
    gains: &FeedforwardGains,
    start: f64,
    duration: f64,
    voltage: F,
    noise: f64,
    rng: &mut R,
) -> Result<Vec<RawSample>>
where
    R: Rng,
    F: Fn(f64) -> f64,
{
    let mut sim = build_sim(gains);
    sim.reset(0.0, 0.0);

    let steps = (duration / SAMPLE_PERIOD_SECS).round() as usize;
    let mut rows = Vec::with_capacity(steps);
    for i in 0..steps {
        let t = i as f64 * SAMPLE_PERIOD_SECS;
        let v = voltage(t);
        let jitter = if noise > 0.0 { rng.random_range(-noise..=noise) } else { 0.0 };
        rows.push(RawSample {
            timestamp: start + t,
            voltage: v,
            position: sim.position(),
            velocity: sim.velocity() + jitter,
        });
        sim.update(v, SAMPLE_PERIOD_SECS)?;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::split_tests;
    use crate::model::AnalysisKind;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn four_tests_start_at_declared_times() {
        let g = FeedforwardGains::from_slice(AnalysisKind::Elevator, &[0.2, 2.0, 0.4, 0.6]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let (slow, fast, starts) = synthesize(&g, 0.01, &mut rng).unwrap();

        let slow_tests = split_tests(&slow);
        let fast_tests = split_tests(&fast);
        assert_eq!(slow_tests.len(), 2);
        assert_eq!(fast_tests.len(), 2);
        assert_eq!(slow_tests[1][0].timestamp, starts[1]);
        assert_eq!(fast_tests[0][0].timestamp, starts[2]);
        assert_eq!(slow.len(), 3200);
        assert_eq!(fast.len(), 800);
    }

    #[test]
    fn noiseless_capture_follows_the_model() {
        let g = FeedforwardGains::from_slice(AnalysisKind::SimpleMotor, &[0.2, 2.0, 0.4]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let (_, fast, _) = synthesize(&g, 0.0, &mut rng).unwrap();
        // steady state of a 4 V step: (4 - Ks) / Kv, time constant Ka / Kv = 0.2 s
        let settled = fast[399].velocity;
        assert!((settled - 1.9).abs() < 1e-3, "settled at {}", settled);
        assert!(fast[400].velocity == 0.0);
        assert!(fast[450].velocity < 0.0);
    }

    #[test]
    fn noise_is_bounded() {
        let g = FeedforwardGains::from_slice(AnalysisKind::SimpleMotor, &[0.2, 2.0, 0.4]).unwrap();
        let (clean, _, _) = synthesize(&g, 0.0, &mut StdRng::seed_from_u64(3)).unwrap();
        let (noisy, _, _) = synthesize(&g, 0.05, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(clean.iter().zip(&noisy).all(|(a, b)| (a.velocity - b.velocity).abs() <= 0.05));
        assert!(clean.iter().zip(&noisy).any(|(a, b)| a.velocity != b.velocity));
    }
}
