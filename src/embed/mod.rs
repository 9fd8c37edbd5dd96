//! Differentiable masked embedding.
//!
//! [`embed`] scatters a dense vector into the true positions of a [`Mask`]
//! inside a larger array. [`embed_pullback`] is its hand-written adjoint: the
//! gradient with respect to the vector is the upstream gradient gathered at
//! the same positions, reduced to the vector's element type. Real vectors
//! embedded into complex arrays take the real part of the gathered gradient.
//!
//! [`MaskedEmbed`] bundles both directions as a [`CustomAdjoint`] operator for
//! use inside a host differentiation system.

pub mod adjoint;
pub mod mask;

pub use adjoint::{CustomAdjoint, MaskedEmbed};
pub use mask::Mask;

use crate::error::{ReparamError, Result};
use ndarray::{Array, Array1, ArrayBase, ArrayD, Data, Dimension, Ix1, LinalgScalar};
use num_complex::{Complex32, Complex64};

/// Pairs a vector element type with the destination element type it embeds into.
pub trait Embeddable<D>: Copy {
    /// Convert a vector element to a destination element.
    fn lift(self) -> D;

    /// Reduce a destination gradient to the vector's element type.
    fn project(gradient: D) -> Self;
}

impl Embeddable<f64> for f64 {
    fn lift(self) -> f64 {
        self
    }

    fn project(gradient: f64) -> Self {
        gradient
    }
}

impl Embeddable<f32> for f32 {
    fn lift(self) -> f32 {
        self
    }

    fn project(gradient: f32) -> Self {
        gradient
    }
}

impl Embeddable<Complex64> for f64 {
    fn lift(self) -> Complex64 {
        Complex64::new(self, 0.0)
    }

    fn project(gradient: Complex64) -> Self {
        gradient.re
    }
}

impl Embeddable<Complex32> for f32 {
    fn lift(self) -> Complex32 {
        Complex32::new(self, 0.0)
    }

    fn project(gradient: Complex32) -> Self {
        gradient.re
    }
}

impl Embeddable<Complex64> for Complex64 {
    fn lift(self) -> Complex64 {
        self
    }

    fn project(gradient: Complex64) -> Self {
        gradient
    }
}

impl Embeddable<Complex32> for Complex32 {
    fn lift(self) -> Complex32 {
        self
    }

    fn project(gradient: Complex32) -> Self {
        gradient
    }
}

/// Marker for an input that receives no gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoTangent;

/// Gradients of [`embed_into`] with respect to each of its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedTangents<T> {
    pub vector: Array1<T>,
    /// The mask is structural.
    pub mask: NoTangent,
    /// The prior destination content does not reach masked positions, and
    /// unmasked positions are not parameters.
    pub destination: NoTangent,
}

fn check_count(vector_len: usize, mask: &Mask) -> Result<()> {
    if vector_len != mask.count() {
        return Err(ReparamError::DimensionMismatch(format!(
            "vector has {} elements but the mask has {} true positions",
            vector_len,
            mask.count()
        )));
    }
    Ok(())
}

/// Scatter `vector` into the true positions of `mask` in a zero array of the mask's shape
///
/// # Arguments
///
/// * `vector` - Values to write, one per true mask position
/// * `mask` - Positions to write to
///
/// # Returns
///
/// The new array, or `DimensionMismatch` if the vector length differs from the
/// number of true positions
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use reparam_rs::embed::{embed, Mask};
///
/// let mask = Mask::from(vec![false, true, true, false]);
/// let out: ndarray::ArrayD<f64> = embed(&array![5.0, 6.0], &mask).unwrap();
/// assert_eq!(out.into_raw_vec(), vec![0.0, 5.0, 6.0, 0.0]);
/// ```
pub fn embed<T, D, S>(vector: &ArrayBase<S, Ix1>, mask: &Mask) -> Result<ArrayD<D>>
where
    T: Embeddable<D>,
    D: LinalgScalar,
    S: Data<Elem = T>,
{
    embed_into(vector, mask, ArrayD::zeros(mask.shape()))
}

/// Scatter `vector` into the true positions of `mask` within `destination`.
///
/// Positions outside the mask keep their prior value. Both preconditions are
/// checked before anything is written.
pub fn embed_into<T, D, S, Dim>(
    vector: &ArrayBase<S, Ix1>,
    mask: &Mask,
    mut destination: Array<D, Dim>,
) -> Result<Array<D, Dim>>
where
    T: Embeddable<D>,
    S: Data<Elem = T>,
    Dim: Dimension,
{
    check_count(vector.len(), mask)?;
    mask.check_shape(destination.shape(), "destination")?;

    let mut values = vector.iter();
    for (slot, selected) in destination.iter_mut().zip(mask.iter()) {
        if selected {
            if let Some(&value) = values.next() {
                *slot = value.lift();
            }
        }
    }
    Ok(destination)
}

/// Pull an upstream gradient back through [`embed_into`]
///
/// # Arguments
///
/// * `upstream` - Gradient with respect to the embedded array, shaped like the mask
/// * `mask` - The mask used for the forward scatter
///
/// # Returns
///
/// The gradient with respect to the vector (the upstream gradient at the true
/// positions, in scatter order, projected to `T`) and no tangent for the mask
/// or the destination
pub fn embed_pullback<T, D, S, Dim>(
    upstream: &ArrayBase<S, Dim>,
    mask: &Mask,
) -> Result<EmbedTangents<T>>
where
    T: Embeddable<D>,
    D: Copy,
    S: Data<Elem = D>,
    Dim: Dimension,
{
    let gathered = mask.gather(upstream)?;
    Ok(EmbedTangents {
        vector: gathered.mapv(T::project),
        mask: NoTangent,
        destination: NoTangent,
    })
}
