//! Robust divergences for handling outliers.
//!
//! Each variant applies a loss `rho(z)` to every residual `z = data - output`
//! and sums the results. Large residuals grow slower than quadratically, so a
//! few outliers cannot dominate the fit.

use super::{check_shapes, Divergence};
use crate::error::{ReparamError, Result};
use ndarray::{ArrayBase, Data, Dimension, Zip};
use std::fmt;

/// Sum of a per-residual penalty `rho` over every element.
///
/// `LeastSquares` gives the same value as `GaussianNorm::default()`; the other
/// variants flatten out for large residuals.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RobustNorm {
    /// `rho(z) = z^2`
    #[default]
    LeastSquares,

    /// Quadratic inside `|z| <= delta`, linear beyond:
    /// `rho(z) = 2 delta |z| - delta^2` for `|z| > delta`
    Huber(f64),

    /// `rho(z) = 2 (sqrt(1 + z^2) - 1)`, close to `z^2` near zero and `2|z|` far out
    SoftL1,

    /// Lorentzian penalty with scale `c`: `rho(z) = ln(1 + (z / c)^2)`
    Cauchy(f64),

    /// `rho(z) = atan(z^2)`, bounded by `pi / 2` per element
    Arctan,
}

impl fmt::Display for RobustNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobustNorm::LeastSquares => write!(f, "sum of squares"),
            RobustNorm::Huber(delta) => write!(f, "Huber norm (delta {})", delta),
            RobustNorm::SoftL1 => write!(f, "soft-L1 norm"),
            RobustNorm::Cauchy(c) => write!(f, "Cauchy norm (scale {})", c),
            RobustNorm::Arctan => write!(f, "arctan norm"),
        }
    }
}

impl RobustNorm {
    /// Construct a Huber norm; `delta` is the switch point between quadratic and linear loss.
    pub fn huber(delta: f64) -> Result<Self> {
        Self::check_scale("delta", delta)?;
        Ok(RobustNorm::Huber(delta))
    }

    /// Construct a Cauchy norm with scale `c`.
    pub fn cauchy(c: f64) -> Result<Self> {
        Self::check_scale("c", c)?;
        Ok(RobustNorm::Cauchy(c))
    }

    fn check_scale(label: &str, value: f64) -> Result<()> {
        if !(value.is_finite() && value > 0.0) {
            return Err(ReparamError::InvalidOptions(format!(
                "{} must be positive and finite, got {}",
                label, value
            )));
        }
        Ok(())
    }

    /// Evaluate ρ for a single residual.
    pub fn rho(&self, residual: f64) -> f64 {
        match *self {
            RobustNorm::LeastSquares => residual * residual,
            RobustNorm::Huber(delta) => {
                let abs_r = residual.abs();
                if abs_r <= delta {
                    residual * residual
                } else {
                    2.0 * delta * abs_r - delta * delta
                }
            }
            RobustNorm::SoftL1 => 2.0 * ((1.0 + residual * residual).sqrt() - 1.0),
            RobustNorm::Cauchy(c) => {
                let z_c = residual / c;
                (1.0 + z_c * z_c).ln()
            }
            RobustNorm::Arctan => (residual * residual).atan(),
        }
    }
}

impl<A, B, D> Divergence<ArrayBase<A, D>, ArrayBase<B, D>> for RobustNorm
where
    A: Data<Elem = f64>,
    B: Data<Elem = f64>,
    D: Dimension,
{
    fn divergence(&self, data: &ArrayBase<A, D>, output: &ArrayBase<B, D>) -> Result<f64> {
        check_shapes(data, output)?;
        let mut total = 0.0;
        Zip::from(data).and(output).for_each(|&d, &o| {
            total += self.rho(d - o);
        });
        Ok(total)
    }
}
