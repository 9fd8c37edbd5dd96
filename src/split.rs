//! Splitting a parameter set into optimizable and fixed parts.
//!
//! [`split`] walks a [`ParameterSet`] in declaration order and produces the
//! optimizable vector (free values as declared, positive values as their
//! square root), the fixed vector, and a [`ResultBuilder`] that maps a raw
//! optimizer result back to named external values.

use crate::error::{ReparamError, Result};
use crate::optimize::MinimizeOutcome;
use crate::parameters::keyed::view_entry;
use crate::parameters::{Constraint, KeyedVector, Layout, NamedValues, ParameterSet, Value};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The per-parameter transform plan shared by the result builder and the
/// forward/backward adapters.
#[derive(Debug)]
pub(crate) struct Plan {
    /// Every declared parameter with its treatment, in declaration order.
    pub(crate) entries: Vec<(String, Constraint)>,
    /// Layout of the optimizable vector.
    pub(crate) layout: Arc<Layout>,
    /// The captured fixed vector.
    pub(crate) fixed: KeyedVector,
}

impl Plan {
    pub(crate) fn constraint(&self, name: &str) -> Option<Constraint> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| *c)
    }

    /// Check a flat optimizer vector against the optimizable layout.
    pub(crate) fn check_len(&self, flat: &Array1<f64>) -> Result<()> {
        if flat.len() != self.layout.len() {
            return Err(ReparamError::DimensionMismatch(format!(
                "Expected {} optimizable values, got {}",
                self.layout.len(),
                flat.len()
            )));
        }
        Ok(())
    }

    /// Resolve one parameter to its external value at the point `flat`.
    pub(crate) fn resolve(&self, flat: &Array1<f64>, name: &str) -> Result<Value> {
        let constraint = self
            .constraint(name)
            .ok_or_else(|| ReparamError::ParameterNotFound(name.to_string()))?;
        match constraint {
            Constraint::Fixed => Ok(self.fixed.get(name)?.to_owned()),
            Constraint::Free | Constraint::Positive => {
                let internal = view_entry(&self.layout, flat, name)?.to_owned();
                constraint.to_external(name, &internal)
            }
        }
    }

    /// Detransform every parameter at the point `flat`, in declaration order.
    pub(crate) fn detransform(&self, flat: &Array1<f64>) -> Result<NamedValues> {
        self.check_len(flat)?;
        let mut named = NamedValues::new();
        for (name, _) in &self.entries {
            named.push(name.clone(), self.resolve(flat, name)?);
        }
        Ok(named)
    }
}

/// The outcome of [`split`].
#[derive(Debug, Clone)]
pub struct Split {
    /// Free values as declared and positive values as their square root.
    pub optimizable: KeyedVector,
    /// Fixed values exactly as declared.
    pub fixed: KeyedVector,
    /// Maps raw optimizer results back to named external values.
    pub builder: ResultBuilder,
}

impl Split {
    pub(crate) fn plan(&self) -> &Arc<Plan> {
        &self.builder.plan
    }
}

/// A raw fit result alongside its external, named form.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    /// The raw result, still in internal representation.
    pub bare: KeyedVector,
    /// Every declared parameter in external form, in declaration order.
    pub external: NamedValues,
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parameters:")?;
        write!(f, "{}", self.external)
    }
}

/// Rebuilds named external values from a raw optimizer result.
///
/// Holds nothing but the transform plan and the captured fixed vector, so
/// `build` is pure in its input.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    plan: Arc<Plan>,
}

impl ResultBuilder {
    /// Build the bare and external results from a keyed raw result.
    ///
    /// The raw result must use the optimizable layout (same names and shapes).
    pub fn build(&self, raw: &KeyedVector) -> Result<FitResult> {
        if raw.layout().as_ref() != self.plan.layout.as_ref() {
            return Err(ReparamError::DimensionMismatch(
                "raw result layout does not match the optimizable layout".to_string(),
            ));
        }
        let external = self.plan.detransform(raw.as_flat())?;
        Ok(FitResult {
            bare: raw.clone(),
            external,
        })
    }

    /// Build the results from a flat optimizer vector.
    pub fn build_flat(&self, raw: &Array1<f64>) -> Result<FitResult> {
        let bare = KeyedVector::from_flat(Arc::clone(&self.plan.layout), raw.clone())?;
        self.build(&bare)
    }

    /// Build the results from the minimizer accessor of an optimization outcome.
    pub fn build_from_outcome(&self, outcome: &MinimizeOutcome) -> Result<FitResult> {
        self.build_flat(outcome.minimizer())
    }

    /// The captured fixed vector.
    pub fn fixed(&self) -> &KeyedVector {
        &self.plan.fixed
    }
}

/// Split a parameter set into its optimizable vector, fixed vector and result builder
///
/// # Arguments
///
/// * `params` - The declared parameters
///
/// # Returns
///
/// The [`Split`], or a `DomainViolation` if a positive parameter was declared
/// with a negative or non-finite element
///
/// # Examples
///
/// ```
/// use reparam_rs::parameters::ParameterSet;
/// use reparam_rs::split;
///
/// let params = ParameterSet::new()
///     .positive("a", 4.0).unwrap()
///     .fixed("b", 2.0).unwrap()
///     .free("c", 1.0).unwrap();
///
/// let parts = split(&params).unwrap();
/// assert_eq!(parts.optimizable.scalar("a").unwrap(), 2.0);
/// assert_eq!(parts.optimizable.scalar("c").unwrap(), 1.0);
/// assert_eq!(parts.fixed.scalar("b").unwrap(), 2.0);
/// ```
pub fn split(params: &ParameterSet) -> Result<Split> {
    let mut optimizable = Vec::new();
    let mut fixed = Vec::new();
    let mut entries = Vec::with_capacity(params.len());

    for (name, annotation) in params.iter() {
        let constraint = annotation.constraint();
        entries.push((name.to_string(), constraint));
        match constraint {
            Constraint::Fixed => fixed.push((name.to_string(), annotation.value().clone())),
            Constraint::Free | Constraint::Positive => {
                let internal = constraint.to_internal(name, annotation.value())?;
                optimizable.push((name.to_string(), internal));
            }
        }
    }

    let optimizable = KeyedVector::from_entries(optimizable)?;
    let fixed = KeyedVector::from_entries(fixed)?;
    debug!(
        optimizable = optimizable.len(),
        fixed = fixed.len(),
        "split parameter set"
    );

    let plan = Arc::new(Plan {
        entries,
        layout: Arc::clone(optimizable.layout()),
        fixed: fixed.clone(),
    });

    Ok(Split {
        optimizable,
        fixed,
        builder: ResultBuilder { plan },
    })
}
