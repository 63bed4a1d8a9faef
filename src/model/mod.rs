//! Actuator models: feedforward gains and forward simulation.
//!
//! Every actuator kind obeys the same voltage balance
//!
//! ```text
//! V = Ks·sgn(v) + Kv·v + Ka·a [+ Kg | + Kcos·cos(x)]
//! ```
//!
//! rearranged as `a = A·v + B·V + c·sgn(v) + d` with `A = -Kv/Ka`, `B = 1/Ka`,
//! `c = -Ks/Ka` and `d` the gravity contribution. The kind is resolved once through
//! [`build_sim`]; everything downstream drives a `dyn ActuatorSim`.

pub mod simple_motor;
pub mod elevator;
pub mod arm;

use std::fmt;

use crate::error::{AnalysisError, Result};

pub use arm::ArmSim;
pub use elevator::ElevatorSim;
pub use simple_motor::SimpleMotorSim;

/// Mechanism being characterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    SimpleMotor,
    Elevator,
    Arm,
}

impl AnalysisKind {
    /// Length of the gains list: `[Ks, Kv, Ka]` plus `Kg` or `Kcos`.
    pub fn gain_count(&self) -> usize {
        match self {
            AnalysisKind::SimpleMotor => 3,
            AnalysisKind::Elevator | AnalysisKind::Arm => 4,
        }
    }

    /// Regressors per observation in the gain fit.
    pub fn independent_variables(&self) -> usize {
        self.gain_count()
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisKind::SimpleMotor => "Simple Motor",
            AnalysisKind::Elevator => "Elevator",
            AnalysisKind::Arm => "Arm",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fitted feedforward gains for one actuator kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedforwardGains {
    pub kind: AnalysisKind,
    pub ks: f64,
    pub kv: f64,
    pub ka: f64,
    /// `Kg` for an elevator, `Kcos` for an arm, 0 for a simple motor.
    pub gravity: f64,
}

impl FeedforwardGains {
    /// Builds from an ordered `[Ks, Kv, Ka, (Kg | Kcos)]` list.
    ///
    /// The list length must match the kind, every gain must be finite and `Ka`
    /// must be non-zero for the dynamics to be defined.
    pub fn from_slice(kind: AnalysisKind, gains: &[f64]) -> Result<Self> {
        let expected = kind.gain_count();
        if gains.len() != expected {
            return Err(AnalysisError::GainCount {
                kind,
                expected,
                got: gains.len(),
            });
        }

        let names = ["Ks", "Kv", "Ka", gravity_name(kind)];
        for (&name, &value) in names.iter().zip(gains) {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidGain { name, value });
            }
        }
        if gains[2] == 0.0 {
            return Err(AnalysisError::InvalidGain { name: "Ka", value: 0.0 });
        }

        Ok(Self {
            kind,
            ks: gains[0],
            kv: gains[1],
            ka: gains[2],
            gravity: gains.get(3).copied().unwrap_or(0.0),
        })
    }

    /// Ordered list form, the inverse of [`FeedforwardGains::from_slice`].
    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = vec![self.ks, self.kv, self.ka];
        if self.kind != AnalysisKind::SimpleMotor {
            out.push(self.gravity);
        }
        out
    }

    /// Static friction voltage: `Ks` carrying the sign of `velocity`, 0 at rest.
    #[inline]
    pub fn static_voltage(&self, velocity: f64) -> f64 {
        if velocity == 0.0 {
            0.0
        } else {
            self.ks.copysign(velocity)
        }
    }

    /// Gravity voltage for this kind; `cos` is the sample's cosine of position.
    #[inline]
    pub fn gravity_voltage(&self, cos: f64) -> f64 {
        match self.kind {
            AnalysisKind::SimpleMotor => 0.0,
            AnalysisKind::Elevator => self.gravity,
            AnalysisKind::Arm => self.gravity * cos,
        }
    }

    /// Voltage the model predicts for a given state.
    pub fn voltage(&self, velocity: f64, acceleration: f64, cos: f64) -> f64 {
        self.static_voltage(velocity) + self.kv * velocity + self.ka * acceleration + self.gravity_voltage(cos)
    }
}

fn gravity_name(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Arm => "Kcos",
        _ => "Kg",
    }
}

/// Forward simulation of an actuator under piecewise-constant voltage.
pub trait ActuatorSim {
    /// Reinitializes the state; nothing carries over from before the reset.
    fn reset(&mut self, position: f64, velocity: f64);

    /// Advances the state by `dt` seconds with `voltage` held constant.
    ///
    /// `voltage` is used as given. A negative `dt` is rejected.
    fn update(&mut self, voltage: f64, dt: f64) -> Result<()>;

    fn velocity(&self) -> f64;

    fn position(&self) -> f64;
}

/// Resolves the kind once and returns the matching simulator.
pub fn build_sim(gains: &FeedforwardGains) -> Box<dyn ActuatorSim + Send> {
    match gains.kind {
        AnalysisKind::SimpleMotor => Box::new(SimpleMotorSim::new(gains.ks, gains.kv, gains.ka)),
        AnalysisKind::Elevator => Box::new(ElevatorSim::new(gains.ks, gains.kv, gains.ka, gains.gravity)),
        AnalysisKind::Arm => Box::new(ArmSim::new(gains.ks, gains.kv, gains.ka, gains.gravity)),
    }
}

/// Sign of `x`, 0 for zero (and NaN).
#[inline]
pub(crate) fn sgn(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[inline]
pub(crate) fn check_dt(dt: f64) -> Result<()> {
    if dt < 0.0 || dt.is_nan() {
        return Err(AnalysisError::NegativeDt { dt });
    }
    Ok(())
}

/// Exact zero-order-hold step of `x' = v`, `v' = a·v + f` for constant forcing `f`.
///
/// Returns the new `(position, velocity)`. Uses series forms of
/// `(e^z - 1)/z` and `(e^z - 1 - z)/z²` near `z = 0`, which covers `Kv = 0`.
pub(crate) fn zoh_step(position: f64, velocity: f64, a: f64, forcing: f64, dt: f64) -> (f64, f64) {
    let z = a * dt;
    let (decay, phi1, phi2) = if z.abs() < 1e-5 {
        (
            1.0 + z + z * z / 2.0,
            1.0 + z / 2.0 + z * z / 6.0,
            0.5 + z / 6.0 + z * z / 24.0,
        )
    } else {
        let ez = z.exp();
        (ez, (ez - 1.0) / z, (ez - 1.0 - z) / (z * z))
    };

    let new_velocity = decay * velocity + dt * phi1 * forcing;
    let new_position = position + dt * phi1 * velocity + dt * dt * phi2 * forcing;
    (new_position, new_velocity)
}
