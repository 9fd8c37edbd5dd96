//! Operators that carry their own reverse-mode rule.
//!
//! A host differentiation system that cannot trace through an operation is
//! handed the operator object instead: it calls [`CustomAdjoint::forward`] on
//! the way forward and [`CustomAdjoint::pullback`] with the upstream gradient
//! on the way back.

use super::{embed, embed_into, embed_pullback, EmbedTangents, Embeddable, Mask};
use crate::error::Result;
use ndarray::{Array1, ArrayD, LinalgScalar};
use std::marker::PhantomData;

/// An operation paired with its hand-written adjoint.
pub trait CustomAdjoint {
    type Input;
    type Output;
    type Tangent;

    /// Evaluate the operation.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;

    /// Map a gradient with respect to the output to gradients with respect to
    /// the inputs.
    fn pullback(&self, upstream: &Self::Output) -> Result<Self::Tangent>;

    /// Forward evaluation together with its pullback at one input.
    fn value_and_pullback(
        &self,
        input: &Self::Input,
        upstream: &Self::Output,
    ) -> Result<(Self::Output, Self::Tangent)> {
        Ok((self.forward(input)?, self.pullback(upstream)?))
    }
}

/// Masked embedding of a `T` vector into a `D` array, as a [`CustomAdjoint`].
#[derive(Debug, Clone)]
pub struct MaskedEmbed<T, D> {
    mask: Mask,
    destination: Option<ArrayD<D>>,
    _vector: PhantomData<fn(T) -> T>,
}

impl<T, D> MaskedEmbed<T, D>
where
    T: Embeddable<D>,
    D: LinalgScalar,
{
    /// Embed into a zero array shaped like the mask.
    pub fn new(mask: Mask) -> Self {
        Self {
            mask,
            destination: None,
            _vector: PhantomData,
        }
    }

    /// Embed into a copy of `destination` on every forward call.
    pub fn with_destination(mask: Mask, destination: ArrayD<D>) -> Result<Self> {
        mask.check_shape(destination.shape(), "destination")?;
        Ok(Self {
            mask,
            destination: Some(destination),
            _vector: PhantomData,
        })
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Length of the vectors this operator accepts.
    pub fn input_len(&self) -> usize {
        self.mask.count()
    }
}

impl<T, D> CustomAdjoint for MaskedEmbed<T, D>
where
    T: Embeddable<D>,
    D: LinalgScalar,
{
    type Input = Array1<T>;
    type Output = ArrayD<D>;
    type Tangent = EmbedTangents<T>;

    fn forward(&self, input: &Array1<T>) -> Result<ArrayD<D>> {
        match &self.destination {
            Some(destination) => embed_into(input, &self.mask, destination.clone()),
            None => embed(input, &self.mask),
        }
    }

    fn pullback(&self, upstream: &ArrayD<D>) -> Result<EmbedTangents<T>> {
        embed_pullback(upstream, &self.mask)
    }
}
