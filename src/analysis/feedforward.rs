//! Feedforward gain fitting by ordinary least squares.
//!
//! Acceleration is the noisiest measured quantity, so it is the dependent variable:
//!
//! ```text
//! a = α·v + β·V + γ·sgn(v) [+ δ·1 | + δ·cos(x)]
//! ```
//!
//! over slow and fast samples together, with no separate intercept. The gains follow
//! as `Ks = −γ/β`, `Kv = −α/β`, `Ka = 1/β` and `Kg | Kcos = −δ/β`.

use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

use crate::data::Storage;
use crate::error::{AnalysisError, Result};
use crate::model::{AnalysisKind, FeedforwardGains, sgn};

/// Fitted gains with the regression's coefficient of determination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedforwardFit {
    pub gains: FeedforwardGains,
    pub r_squared: f64,
}

/// Regresses acceleration over both groups of `data` and converts the
/// coefficients into gains for `kind`.
pub fn calculate_feedforward_gains(data: &Storage, kind: AnalysisKind) -> Result<FeedforwardFit> {
    data.validate(("slow", "fast"))?;

    let cols = kind.independent_variables();
    let rows = data.len();
    if rows < cols {
        warn!("{} observations cannot determine {} coefficients", rows, cols);
        return Err(AnalysisError::SingularFit);
    }

    let mut x = DMatrix::<f64>::zeros(rows, cols);
    let mut y = DVector::<f64>::zeros(rows);
    for (r, s) in data.slow.iter().chain(data.fast.iter()).enumerate() {
        y[r] = s.acceleration;
        x[(r, 0)] = s.velocity;
        x[(r, 1)] = s.voltage;
        x[(r, 2)] = sgn(s.velocity);
        match kind {
            AnalysisKind::SimpleMotor => {}
            AnalysisKind::Elevator => x[(r, 3)] = 1.0,
            AnalysisKind::Arm => x[(r, 3)] = s.cos,
        }
    }

    // Normal equations: (XᵀX) c = Xᵀy
    let xt = x.transpose();
    let coeffs = (&xt * &x)
        .lu()
        .solve(&(&xt * &y))
        .ok_or(AnalysisError::SingularFit)?;
    if coeffs.iter().any(|c| !c.is_finite()) || coeffs[1] == 0.0 {
        return Err(AnalysisError::SingularFit);
    }

    let r_squared = coefficient_of_determination(&x, &y, &coeffs)?;

    let beta = coeffs[1];
    let mut gains = vec![-coeffs[2] / beta, -coeffs[0] / beta, 1.0 / beta];
    if cols > 3 {
        gains.push(-coeffs[3] / beta);
    }
    let gains = FeedforwardGains::from_slice(kind, &gains)?;

    debug!("{} fit over {} samples: {:?}, R² = {:.6}", kind, rows, gains.to_vec(), r_squared);
    Ok(FeedforwardFit { gains, r_squared })
}

fn coefficient_of_determination(x: &DMatrix<f64>, y: &DVector<f64>, coeffs: &DVector<f64>) -> Result<f64> {
    let residual = y - x * coeffs;
    let sse = residual.norm_squared();
    let mean = y.mean();
    let sst: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    if sst == 0.0 {
        return Err(AnalysisError::ZeroVariance);
    }
    Ok(1.0 - sse / sst)
}
