//! Voltage decomposition against fitted gains.
//!
//! Subtracting every modelled term but one leaves the voltage that term should
//! explain. Plotted against its rate (velocity for slow tests, acceleration for fast
//! ones) the result should lie on a line of slope `Kv` or `Ka`.

use crate::data::Sample;
use crate::model::FeedforwardGains;

/// Voltage left for the velocity term: `V − sgn(v)·Ks − Ka·a − gravity`.
#[inline]
pub fn velocity_portion(gains: &FeedforwardGains, s: &Sample) -> f64 {
    s.voltage - gains.static_voltage(s.velocity) - gains.ka * s.acceleration - gains.gravity_voltage(s.cos)
}

/// Voltage left for the acceleration term: `V − sgn(v)·Ks − Kv·v − gravity`.
#[inline]
pub fn acceleration_portion(gains: &FeedforwardGains, s: &Sample) -> f64 {
    s.voltage - gains.static_voltage(s.velocity) - gains.kv * s.velocity - gains.gravity_voltage(s.cos)
}
