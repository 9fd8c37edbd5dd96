//! Composing a scalar loss from data, a forward adapter and a divergence.

use crate::adapter::{Forward, ParamGetter};
use crate::divergence::Divergence;
use crate::error::Result;
use crate::optimize::Objective;
use ndarray::Array1;
use std::marker::PhantomData;

/// A scalar function of the optimizable vector.
///
/// Evaluating the loss runs the forward model at the point and scores its
/// output against the captured data. Nothing is cached between calls.
pub struct Loss<D, M, V, O> {
    data: D,
    forward: Forward<M>,
    divergence: V,
    _output: PhantomData<fn() -> O>,
}

impl<D, M, V, O> Loss<D, M, V, O>
where
    M: Fn(&ParamGetter<'_>) -> Result<O>,
    V: Divergence<D, O>,
{
    /// Evaluate the loss at a point of the optimizable vector.
    pub fn eval(&self, point: &Array1<f64>) -> Result<f64> {
        let output = self.forward.eval(point)?;
        self.divergence.divergence(&self.data, &output)
    }

    pub fn dim(&self) -> usize {
        self.forward.dim()
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn forward(&self) -> &Forward<M> {
        &self.forward
    }
}

impl<D, M, V, O> Clone for Loss<D, M, V, O>
where
    D: Clone,
    M: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            forward: self.forward.clone(),
            divergence: self.divergence.clone(),
            _output: PhantomData,
        }
    }
}

impl<D, M, V, O> Objective for Loss<D, M, V, O>
where
    M: Fn(&ParamGetter<'_>) -> Result<O>,
    V: Divergence<D, O>,
{
    fn dim(&self) -> usize {
        Loss::dim(self)
    }

    fn cost(&self, point: &Array1<f64>) -> Result<f64> {
        self.eval(point)
    }
}

/// Compose a loss from observed data, a forward adapter and a divergence
///
/// # Arguments
///
/// * `data` - The observed data the model output is compared against
/// * `forward` - The forward adapter from [`make_forward`](crate::make_forward)
/// * `divergence` - Any [`Divergence`] between data and model output
///
/// # Returns
///
/// A [`Loss`] callable with the optimizable vector
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use reparam_rs::divergence::GaussianNorm;
/// use reparam_rs::parameters::ParameterSet;
/// use reparam_rs::{make_forward, make_loss, split};
///
/// let params = ParameterSet::new().free("offset", 0.0).unwrap();
/// let parts = split(&params).unwrap();
/// let (forward, _) = make_forward(
///     |p| Ok(array![1.0, 2.0] + p.scalar("offset")?),
///     &parts,
/// );
/// let loss = make_loss(array![2.0, 3.0], forward, GaussianNorm::default());
/// assert_eq!(loss.eval(&array![1.0]).unwrap(), 0.0);
/// assert_eq!(loss.eval(&array![0.0]).unwrap(), 2.0);
/// ```
pub fn make_loss<D, M, V, O>(data: D, forward: Forward<M>, divergence: V) -> Loss<D, M, V, O>
where
    M: Fn(&ParamGetter<'_>) -> Result<O>,
    V: Divergence<D, O>,
{
    Loss {
        data,
        forward,
        divergence,
        _output: PhantomData,
    }
}
