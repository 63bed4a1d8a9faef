//! arm.rs
//! Pivoting arm: gravity voltage scales with `cos(position)`, so position is part of
//! the state and the dynamics are nonlinear.
//!
//! Integrated with classic RK4, splitting each update into substeps no longer than
//! [`MAX_SUBSTEP_SECS`].

use crate::error::Result;
use crate::model::{ActuatorSim, check_dt, sgn};

/// Longest single RK4 step.
pub const MAX_SUBSTEP_SECS: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct ArmSim {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    position: f64,
    velocity: f64,
}

impl ArmSim {
    pub fn new(ks: f64, kv: f64, ka: f64, kcos: f64) -> Self {
        Self {
            a: -kv / ka,
            b: 1.0 / ka,
            c: -ks / ka,
            d: -kcos / ka,
            position: 0.0,
            velocity: 0.0,
        }
    }

    /// `(x', v')` at state `(x, v)` under `voltage`.
    #[inline]
    fn derivative(&self, x: f64, v: f64, voltage: f64) -> (f64, f64) {
        (v, self.a * v + self.b * voltage + self.c * sgn(v) + self.d * x.cos())
    }

    fn rk4(&self, x: f64, v: f64, voltage: f64, h: f64) -> (f64, f64) {
        let (k1x, k1v) = self.derivative(x, v, voltage);
        let (k2x, k2v) = self.derivative(x + 0.5 * h * k1x, v + 0.5 * h * k1v, voltage);
        let (k3x, k3v) = self.derivative(x + 0.5 * h * k2x, v + 0.5 * h * k2v, voltage);
        let (k4x, k4v) = self.derivative(x + h * k3x, v + h * k3v, voltage);
        (
            x + h / 6.0 * (k1x + 2.0 * k2x + 2.0 * k3x + k4x),
            v + h / 6.0 * (k1v + 2.0 * k2v + 2.0 * k3v + k4v),
        )
    }
}

impl ActuatorSim for ArmSim {
    fn reset(&mut self, position: f64, velocity: f64) {
        self.position = position;
        self.velocity = velocity;
    }

    fn update(&mut self, voltage: f64, dt: f64) -> Result<()> {
        check_dt(dt)?;
        if dt == 0.0 {
            return Ok(());
        }

        // slack keeps round-off in a recorded dt (0.005000000000000782) from adding a substep
        let steps = (dt / MAX_SUBSTEP_SECS * (1.0 - 1e-9)).ceil().max(1.0) as usize;
        let h = dt / steps as f64;
        let (mut x, mut v) = (self.position, self.velocity);
        for _ in 0..steps {
            (x, v) = self.rk4(x, v, voltage, h);
        }
        self.position = x;
        self.velocity = v;
        Ok(())
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }

    fn position(&self) -> f64 {
        self.position
    }
}
