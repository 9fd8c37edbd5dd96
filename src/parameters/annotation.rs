//! Parameter annotations and their transform pairs
//!
//! Every declared parameter carries one of three annotations. The annotation
//! decides whether the optimizer sees the parameter at all, and if it does, in
//! which representation. The transform pair for each kind lives in a single
//! `match` on [`Constraint`], so adding a new kind of constraint means adding a
//! variant and its two transforms here.

use crate::error::{ReparamError, Result};
use ndarray::{arr0, Array1, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The numeric value of a parameter: a scalar (0-d array) or an array of any shape.
pub type Value = ArrayD<f64>;

/// Conversion into a parameter [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        arr0(self).into_dyn()
    }
}

impl IntoValue for Vec<f64> {
    fn into_value(self) -> Value {
        Array1::from_vec(self).into_dyn()
    }
}

impl IntoValue for &[f64] {
    fn into_value(self) -> Value {
        Array1::from_vec(self.to_vec()).into_dyn()
    }
}

impl IntoValue for Array1<f64> {
    fn into_value(self) -> Value {
        self.into_dyn()
    }
}

impl IntoValue for ArrayD<f64> {
    fn into_value(self) -> Value {
        self
    }
}

/// How a declared parameter participates in fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    /// Optimized as-is.
    Free,

    /// Excluded from optimization and passed through unchanged.
    Fixed,

    /// Optimized as its element-wise square root; the external value is the square.
    Positive,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Free => write!(f, "free"),
            Constraint::Fixed => write!(f, "fixed"),
            Constraint::Positive => write!(f, "positive"),
        }
    }
}

impl Constraint {
    /// Whether the optimizer searches over this parameter.
    pub fn is_optimized(&self) -> bool {
        !matches!(self, Constraint::Fixed)
    }

    /// Transform an external value into the representation the optimizer sees
    ///
    /// # Arguments
    ///
    /// * `name` - Parameter name, used for error reporting
    /// * `external` - The user-facing value
    ///
    /// # Returns
    ///
    /// The internal value, or a `DomainViolation` if a `Positive` value has a
    /// negative or non-finite element
    pub fn to_internal(&self, name: &str, external: &Value) -> Result<Value> {
        match self {
            Constraint::Free | Constraint::Fixed => Ok(external.clone()),
            Constraint::Positive => {
                if let Some(bad) = external.iter().find(|v| !v.is_finite() || **v < 0.0) {
                    return Err(ReparamError::domain(
                        name,
                        format!("positive parameter has element {}", bad),
                    ));
                }
                Ok(external.mapv(f64::sqrt))
            }
        }
    }

    /// Transform an internal (optimizer-side) value back into its external value
    ///
    /// Any finite internal value is valid: squaring maps the whole real line
    /// onto `[0, inf)`. A non-finite element of a `Positive` value is a
    /// `DomainViolation`.
    pub fn to_external(&self, name: &str, internal: &Value) -> Result<Value> {
        match self {
            Constraint::Free | Constraint::Fixed => Ok(internal.clone()),
            Constraint::Positive => {
                if internal.iter().any(|v| !v.is_finite()) {
                    return Err(ReparamError::domain(
                        name,
                        "internal value of positive parameter is not finite",
                    ));
                }
                Ok(internal.mapv(|u| u * u))
            }
        }
    }

    /// Scale a gradient taken with respect to the external value so that it is
    /// taken with respect to the internal value (chain rule through `to_external`).
    pub fn scale_gradient(&self, internal: &Value, external_gradient: &Value) -> Result<Value> {
        if internal.shape() != external_gradient.shape() {
            return Err(ReparamError::DimensionMismatch(format!(
                "gradient shape {:?} does not match value shape {:?}",
                external_gradient.shape(),
                internal.shape()
            )));
        }
        match self {
            Constraint::Free | Constraint::Fixed => Ok(external_gradient.clone()),
            Constraint::Positive => Ok(internal * external_gradient * 2.0),
        }
    }
}

/// A declared parameter value tagged with its optimization treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    Free(Value),
    Fixed(Value),
    Positive(Value),
}

impl Annotation {
    /// A parameter optimized directly.
    ///
    /// # Examples
    ///
    /// ```
    /// use reparam_rs::parameters::{Annotation, Constraint};
    ///
    /// let a = Annotation::free(1.5);
    /// assert_eq!(a.constraint(), Constraint::Free);
    /// assert_eq!(a.value().ndim(), 0);
    /// ```
    pub fn free(value: impl IntoValue) -> Self {
        Annotation::Free(value.into_value())
    }

    /// A parameter held at its declared value.
    pub fn fixed(value: impl IntoValue) -> Self {
        Annotation::Fixed(value.into_value())
    }

    /// A parameter kept non-negative through a square-root reparameterization.
    pub fn positive(value: impl IntoValue) -> Self {
        Annotation::Positive(value.into_value())
    }

    pub fn constraint(&self) -> Constraint {
        match self {
            Annotation::Free(_) => Constraint::Free,
            Annotation::Fixed(_) => Constraint::Fixed,
            Annotation::Positive(_) => Constraint::Positive,
        }
    }

    /// The declared (external) value.
    pub fn value(&self) -> &Value {
        match self {
            Annotation::Free(v) | Annotation::Fixed(v) | Annotation::Positive(v) => v,
        }
    }

    pub fn shape(&self) -> IxDyn {
        self.value().raw_dim()
    }
}
