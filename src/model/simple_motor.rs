//! simple_motor.rs
//! Flywheel / drivetrain style actuator: `V = Ks·sgn(v) + Kv·v + Ka·a`.
//!
//! Stepped with the exact zero-order-hold solution of the linear part; the friction
//! sign is frozen at the start of each step.

use crate::error::Result;
use crate::model::{ActuatorSim, check_dt, sgn, zoh_step};

#[derive(Debug, Clone)]
pub struct SimpleMotorSim {
    a: f64,
    b: f64,
    c: f64,
    position: f64,
    velocity: f64,
}

impl SimpleMotorSim {
    /// `ka` must be non-zero; [`crate::model::FeedforwardGains`] guarantees it.
    pub fn new(ks: f64, kv: f64, ka: f64) -> Self {
        Self {
            a: -kv / ka,
            b: 1.0 / ka,
            c: -ks / ka,
            position: 0.0,
            velocity: 0.0,
        }
    }
}

impl ActuatorSim for SimpleMotorSim {
    fn reset(&mut self, position: f64, velocity: f64) {
        self.position = position;
        self.velocity = velocity;
    }

    fn update(&mut self, voltage: f64, dt: f64) -> Result<()> {
        check_dt(dt)?;
        let forcing = self.b * voltage + self.c * sgn(self.velocity);
        let (position, velocity) = zoh_step(self.position, self.velocity, self.a, forcing, dt);
        self.position = position;
        self.velocity = velocity;
        Ok(())
    }

    #[inline]
    fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    fn position(&self) -> f64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    #[test]
    fn settles_at_steady_state_velocity() {
        // (12 - 1) / 2 = 5.5
        let mut sim = SimpleMotorSim::new(1.0, 2.0, 0.5);
        sim.reset(0.0, 0.1);
        for _ in 0..1000 {
            sim.update(12.0, 0.01).unwrap();
        }
        assert!((sim.velocity() - 5.5).abs() < 1e-9);
        assert!(sim.position() > 0.0);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut sim = SimpleMotorSim::new(1.0, 2.0, 0.5);
        sim.reset(3.0, -1.5);
        sim.update(12.0, 0.0).unwrap();
        assert_eq!(sim.velocity(), -1.5);
        assert_eq!(sim.position(), 3.0);
    }

    #[test]
    fn negative_dt_rejected() {
        let mut sim = SimpleMotorSim::new(1.0, 2.0, 0.5);
        assert!(matches!(sim.update(1.0, -0.01), Err(AnalysisError::NegativeDt { .. })));
    }

    #[test]
    fn identical_inputs_are_bit_identical() {
        let run = || {
            let mut sim = SimpleMotorSim::new(0.3, 1.7, 0.21);
            sim.reset(0.0, 0.0);
            for i in 0..100 {
                sim.update(6.0 * (i as f64 * 0.1).sin(), 0.005 + 1e-4 * i as f64).unwrap();
            }
            sim.velocity()
        };
        assert_eq!(run().to_bits(), run().to_bits());
    }

    #[test]
    fn reset_discards_history() {
        let mut sim = SimpleMotorSim::new(1.0, 2.0, 0.5);
        sim.reset(0.0, 0.0);
        sim.update(12.0, 1.0).unwrap();
        sim.reset(0.0, 2.0);
        assert_eq!(sim.velocity(), 2.0);
    }
}
