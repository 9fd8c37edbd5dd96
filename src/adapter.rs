//! Forward and backward model adapters.
//!
//! A user model is written against external values only. [`make_forward`]
//! wraps it so it can be evaluated at a point of the optimizable vector: the
//! model receives a [`ParamGetter`] and asks for the parameters it needs by
//! name, getting fixed values straight from the fixed vector, positive values
//! squared back, and free values as-is. [`Backward`] goes the other way and
//! turns any point of the optimizable vector into named external values.

use crate::error::{ReparamError, Result};
use crate::parameters::keyed::scalar_of;
use crate::parameters::{Constraint, KeyedVector, NamedValues, Value};
use crate::split::{Plan, Split};
use ndarray::Array1;
use std::sync::Arc;

/// Lazy, by-name access to external parameter values at one point.
pub struct ParamGetter<'a> {
    plan: &'a Plan,
    point: &'a Array1<f64>,
}

impl<'a> ParamGetter<'a> {
    /// External value of a parameter.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.plan.resolve(self.point, name)
    }

    /// External value of a scalar parameter.
    pub fn scalar(&self, name: &str) -> Result<f64> {
        let value = self.get(name)?;
        scalar_of(name, value.iter().copied(), value.len())
    }

    /// External value of a parameter as a flat vector.
    pub fn vector(&self, name: &str) -> Result<Array1<f64>> {
        let value = self.get(name)?;
        Ok(Array1::from_iter(value.iter().copied()))
    }
}

/// A model callable with the optimizable vector.
#[derive(Clone)]
pub struct Forward<M> {
    model: M,
    plan: Arc<Plan>,
}

impl<M> Forward<M> {
    /// Evaluate the model at a point of the optimizable vector
    ///
    /// # Arguments
    ///
    /// * `point` - Flat optimizable vector
    ///
    /// # Returns
    ///
    /// The model output, or `DimensionMismatch` if `point` does not match the
    /// optimizable layout
    pub fn eval<O>(&self, point: &Array1<f64>) -> Result<O>
    where
        M: Fn(&ParamGetter<'_>) -> Result<O>,
    {
        self.plan.check_len(point)?;
        let getter = ParamGetter {
            plan: &self.plan,
            point,
        };
        (self.model)(&getter)
    }

    /// Evaluate the model at a keyed point.
    pub fn eval_keyed<O>(&self, point: &KeyedVector) -> Result<O>
    where
        M: Fn(&ParamGetter<'_>) -> Result<O>,
    {
        self.eval(point.as_flat())
    }

    /// Length of the optimizable vector this adapter expects.
    pub fn dim(&self) -> usize {
        self.plan.layout.len()
    }
}

/// Maps points of the optimizable vector back to named external values.
#[derive(Debug, Clone)]
pub struct Backward {
    plan: Arc<Plan>,
}

impl Backward {
    /// Detransform a flat optimizable point.
    pub fn eval(&self, raw: &Array1<f64>) -> Result<NamedValues> {
        self.plan.detransform(raw)
    }

    /// Detransform a keyed optimizable point.
    pub fn eval_keyed(&self, raw: &KeyedVector) -> Result<NamedValues> {
        if raw.layout().as_ref() != self.plan.layout.as_ref() {
            return Err(ReparamError::DimensionMismatch(
                "point layout does not match the optimizable layout".to_string(),
            ));
        }
        self.plan.detransform(raw.as_flat())
    }

    /// Map gradients taken with respect to external values onto the flat
    /// optimizable vector, applying the chain rule of each transform.
    ///
    /// `external_gradients` must hold an entry for every optimizable
    /// parameter; entries for fixed parameters are ignored.
    pub fn internal_gradient(
        &self,
        point: &Array1<f64>,
        external_gradients: &NamedValues,
    ) -> Result<Array1<f64>> {
        self.plan.check_len(point)?;
        let layout = &self.plan.layout;
        let mut gradient = Array1::zeros(layout.len());
        for (name, constraint) in &self.plan.entries {
            if *constraint == Constraint::Fixed {
                continue;
            }
            let external = external_gradients
                .get(name)
                .ok_or_else(|| ReparamError::ParameterNotFound(name.clone()))?;
            let range = layout
                .range(name)
                .ok_or_else(|| ReparamError::ParameterNotFound(name.clone()))?;
            let internal = crate::parameters::keyed::view_entry(layout, point, name)?.to_owned();
            let scaled = constraint.scale_gradient(&internal, external)?;
            for (slot, g) in gradient
                .slice_mut(ndarray::s![range])
                .iter_mut()
                .zip(scaled.iter())
            {
                *slot = *g;
            }
        }
        Ok(gradient)
    }
}

/// Wrap a model so it can be evaluated at points of the optimizable vector
///
/// # Arguments
///
/// * `model` - A function of a [`ParamGetter`] written against external values
/// * `split` - The split parameter set the optimizable vector comes from
///
/// # Returns
///
/// The forward adapter and its inverse
///
/// # Examples
///
/// ```
/// use reparam_rs::parameters::ParameterSet;
/// use reparam_rs::{make_forward, split};
///
/// let params = ParameterSet::new()
///     .positive("a", 4.0).unwrap()
///     .fixed("b", 2.0).unwrap()
///     .free("c", 1.0).unwrap();
/// let parts = split(&params).unwrap();
///
/// let (forward, backward) = make_forward(
///     |p| Ok(p.scalar("a")? + p.scalar("b")? * p.scalar("c")?),
///     &parts,
/// );
/// assert_eq!(forward.eval(parts.optimizable.as_flat()).unwrap(), 6.0);
/// assert_eq!(backward.eval(parts.optimizable.as_flat()).unwrap().scalar("a").unwrap(), 4.0);
/// ```
pub fn make_forward<M, O>(model: M, split: &Split) -> (Forward<M>, Backward)
where
    M: Fn(&ParamGetter<'_>) -> Result<O>,
{
    let plan = Arc::clone(split.plan());
    (
        Forward {
            model,
            plan: Arc::clone(&plan),
        },
        Backward { plan },
    )
}
