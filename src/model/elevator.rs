//! elevator.rs
//! Vertical carriage: a simple motor plus a constant gravity voltage `Kg`.

use crate::error::Result;
use crate::model::{ActuatorSim, check_dt, sgn, zoh_step};

#[derive(Debug, Clone)]
pub struct ElevatorSim {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    position: f64,
    velocity: f64,
}

impl ElevatorSim {
    pub fn new(ks: f64, kv: f64, ka: f64, kg: f64) -> Self {
        Self {
            a: -kv / ka,
            b: 1.0 / ka,
            c: -ks / ka,
            d: -kg / ka,
            position: 0.0,
            velocity: 0.0,
        }
    }
}

impl ActuatorSim for ElevatorSim {
    fn reset(&mut self, position: f64, velocity: f64) {
        self.position = position;
        self.velocity = velocity;
    }

    fn update(&mut self, voltage: f64, dt: f64) -> Result<()> {
        check_dt(dt)?;
        // gravity pulls the same way regardless of direction of travel
        let forcing = self.b * voltage + self.c * sgn(self.velocity) + self.d;
        let (position, velocity) = zoh_step(self.position, self.velocity, self.a, forcing, dt);
        self.position = position;
        self.velocity = velocity;
        Ok(())
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }

    fn position(&self) -> f64 {
        self.position
    }
}
