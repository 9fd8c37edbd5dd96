//! Divergences between observed data and model output.
//!
//! The loss composer takes any [`Divergence`]; nothing in the crate resolves a
//! default from ambient state. [`GaussianNorm`] is the documented default
//! (sum of squared residuals, optionally scaled by a noise level), and
//! [`RobustNorm`] offers outlier-resistant per-residual losses.

pub mod robust;

pub use robust::RobustNorm;

use crate::error::{ReparamError, Result};
use ndarray::{ArrayBase, Data, Dimension, Zip};
use num_complex::{Complex32, Complex64};

/// A scalar discrepancy between observed data and a model output.
///
/// Implemented for every closure of the form `Fn(&D, &O) -> Result<f64>`.
pub trait Divergence<D: ?Sized, O: ?Sized> {
    fn divergence(&self, data: &D, output: &O) -> Result<f64>;
}

impl<D: ?Sized, O: ?Sized, F> Divergence<D, O> for F
where
    F: Fn(&D, &O) -> Result<f64>,
{
    fn divergence(&self, data: &D, output: &O) -> Result<f64> {
        self(data, output)
    }
}

/// Element types with a squared distance, real or complex.
pub trait SquaredDistance: Copy {
    fn squared_distance(self, other: Self) -> f64;
}

impl SquaredDistance for f64 {
    fn squared_distance(self, other: Self) -> f64 {
        let d = self - other;
        d * d
    }
}

impl SquaredDistance for f32 {
    fn squared_distance(self, other: Self) -> f64 {
        let d = f64::from(self) - f64::from(other);
        d * d
    }
}

impl SquaredDistance for Complex64 {
    fn squared_distance(self, other: Self) -> f64 {
        (self - other).norm_sqr()
    }
}

impl SquaredDistance for Complex32 {
    fn squared_distance(self, other: Self) -> f64 {
        f64::from((self - other).norm_sqr())
    }
}

pub(crate) fn check_shapes<A, B, D>(data: &ArrayBase<A, D>, output: &ArrayBase<B, D>) -> Result<()>
where
    A: Data,
    B: Data,
    D: Dimension,
{
    if data.shape() != output.shape() {
        return Err(ReparamError::DimensionMismatch(format!(
            "data shape {:?} does not match model output shape {:?}",
            data.shape(),
            output.shape()
        )));
    }
    Ok(())
}

/// Sum of squared residuals, scaled by `scale`.
///
/// With [`GaussianNorm::with_sigma`] the scale is `1 / (2 sigma^2)`, which is
/// the Gaussian negative log-likelihood up to an additive constant. Complex
/// residuals contribute their squared modulus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNorm {
    pub scale: f64,
}

impl Default for GaussianNorm {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl GaussianNorm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gaussian norm for a known noise standard deviation.
    pub fn with_sigma(sigma: f64) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(ReparamError::InvalidOptions(format!(
                "sigma must be positive and finite, got {}",
                sigma
            )));
        }
        Ok(Self {
            scale: 1.0 / (2.0 * sigma * sigma),
        })
    }
}

impl<T, A, B, D> Divergence<ArrayBase<A, D>, ArrayBase<B, D>> for GaussianNorm
where
    T: SquaredDistance,
    A: Data<Elem = T>,
    B: Data<Elem = T>,
    D: Dimension,
{
    fn divergence(&self, data: &ArrayBase<A, D>, output: &ArrayBase<B, D>) -> Result<f64> {
        check_shapes(data, output)?;
        let mut total = 0.0;
        Zip::from(data).and(output).for_each(|&d, &o| {
            total += d.squared_distance(o);
        });
        Ok(self.scale * total)
    }
}
