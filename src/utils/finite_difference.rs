//! Finite difference methods for numerical differentiation.
//!
//! The driver uses these to supply gradients to quasi-Newton solvers, and
//! [`check_gradient`] compares an analytic gradient (for example one produced
//! by a custom adjoint) against central differences.

use crate::error::{ReparamError, Result};
use ndarray::Array1;

/// Default relative step for central differences, `cbrt(f64::EPSILON)`.
pub const DEFAULT_EPSILON: f64 = 6.055_454_452_393_34e-6;

/// Step used for coordinate `x`, scaled to the magnitude of the coordinate.
fn step(x: f64, eps: f64) -> f64 {
    if x.abs() > 1.0 {
        x.abs() * eps
    } else {
        eps
    }
}

/// Compute the gradient of a scalar function using central finite differences.
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `params` - The point at which to evaluate the gradient
/// * `epsilon` - Relative step size (optional, defaults to [`DEFAULT_EPSILON`])
///
/// # Returns
///
/// * `Result<Array1<f64>>` - The gradient vector
pub fn gradient<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let mut grad = Array1::zeros(params.len());
    let mut probe = params.clone();

    for j in 0..params.len() {
        let h = step(params[j], eps);

        probe[j] = params[j] + h;
        let f_forward = f(&probe)?;
        probe[j] = params[j] - h;
        let f_backward = f(&probe)?;
        probe[j] = params[j];

        grad[j] = (f_forward - f_backward) / (2.0 * h);
    }

    Ok(grad)
}

/// Outcome of comparing an analytic gradient with a numerical one.
#[derive(Debug, Clone)]
pub struct GradientCheck {
    pub analytic: Array1<f64>,
    pub numerical: Array1<f64>,
    /// Largest absolute difference over all coordinates.
    pub max_abs_error: f64,
}

impl GradientCheck {
    pub fn passes(&self, tolerance: f64) -> bool {
        self.max_abs_error <= tolerance
    }
}

/// Compare `analytic` against the central-difference gradient of `f` at `params`.
pub fn check_gradient<F>(
    f: F,
    params: &Array1<f64>,
    analytic: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<GradientCheck>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    if analytic.len() != params.len() {
        return Err(ReparamError::DimensionMismatch(format!(
            "Expected gradient of length {}, got {}",
            params.len(),
            analytic.len()
        )));
    }
    let numerical = gradient(f, params, epsilon)?;
    let max_abs_error = analytic
        .iter()
        .zip(numerical.iter())
        .map(|(a, n)| (a - n).abs())
        .fold(0.0, f64::max);

    Ok(GradientCheck {
        analytic: analytic.clone(),
        numerical,
        max_abs_error,
    })
}
