//! End-to-end fitting: split, adapt, compose the loss, minimize and rebuild.

use crate::adapter::{make_forward, ParamGetter};
use crate::divergence::Divergence;
use crate::error::Result;
use crate::loss::make_loss;
use crate::optimize::{optimize_with, ArgminMinimizer, MinimizeOutcome, Minimizer, Objective, OptimizeOptions};
use crate::parameters::{NamedValues, ParameterSet};
use crate::split::{split, FitResult};
use crate::utils::{self, GradientCheck};
use ndarray::Array1;
use std::fmt;
use tracing::debug;

/// A finished fit: the rebuilt parameters and the minimizer's report.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub result: FitResult,
    pub outcome: MinimizeOutcome,
}

impl FitReport {
    pub fn converged(&self) -> bool {
        self.outcome.converged()
    }

    /// Every declared parameter in external form.
    pub fn parameters(&self) -> &NamedValues {
        &self.result.external
    }

    pub fn scalar(&self, name: &str) -> Result<f64> {
        self.result.external.scalar(name)
    }
}

impl fmt::Display for FitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Results:")?;
        writeln!(f, "  {}", self.outcome.status)?;
        writeln!(f, "  Minimum: {:.6e}", self.outcome.minimum)?;
        writeln!(
            f,
            "  Iterations: {} ({} loss evaluations)",
            self.outcome.iterations, self.outcome.cost_evals
        )?;
        write!(f, "{}", self.result)
    }
}

/// Fit a model to data with the stock minimizer
///
/// # Arguments
///
/// * `model` - A function of a [`ParamGetter`] written against external values
/// * `params` - The declared parameters; their values are the start point
/// * `data` - The observed data
/// * `divergence` - Discrepancy between `data` and the model output
/// * `options` - Optimizer options
///
/// # Returns
///
/// The rebuilt parameters together with the minimizer's outcome
///
/// # Examples
///
/// ```
/// use ndarray::{array, Array1};
/// use reparam_rs::divergence::GaussianNorm;
/// use reparam_rs::optimize::OptimizeOptions;
/// use reparam_rs::parameters::ParameterSet;
/// use reparam_rs::fit;
///
/// let x: Array1<f64> = Array1::linspace(0.0, 1.0, 11);
/// let y = x.mapv(|x| 3.0 * x + 0.5);
/// let params = ParameterSet::new()
///     .positive("slope", 1.0).unwrap()
///     .free("intercept", 0.0).unwrap();
///
/// let report = fit(
///     |p| {
///         let slope = p.scalar("slope")?;
///         let intercept = p.scalar("intercept")?;
///         Ok(x.mapv(|x| slope * x + intercept))
///     },
///     &params,
///     y,
///     GaussianNorm::default(),
///     &OptimizeOptions::default(),
/// )
/// .unwrap();
///
/// assert!((report.scalar("slope").unwrap() - 3.0).abs() < 1e-4);
/// assert!((report.scalar("intercept").unwrap() - 0.5).abs() < 1e-4);
/// ```
pub fn fit<M, O, D, V>(
    model: M,
    params: &ParameterSet,
    data: D,
    divergence: V,
    options: &OptimizeOptions,
) -> Result<FitReport>
where
    M: Fn(&ParamGetter<'_>) -> Result<O>,
    V: Divergence<D, O>,
{
    fit_with(&ArgminMinimizer, model, params, data, divergence, options)
}

/// Fit a model to data with a caller-supplied minimizer.
pub fn fit_with<Mz, M, O, D, V>(
    minimizer: &Mz,
    model: M,
    params: &ParameterSet,
    data: D,
    divergence: V,
    options: &OptimizeOptions,
) -> Result<FitReport>
where
    Mz: Minimizer + ?Sized,
    M: Fn(&ParamGetter<'_>) -> Result<O>,
    V: Divergence<D, O>,
{
    let parts = split(params)?;
    let (forward, _) = make_forward(model, &parts);
    let loss = make_loss(data, forward, divergence);

    let outcome = optimize_with(minimizer, &loss, parts.optimizable.as_flat(), options)?;
    let result = parts.builder.build_from_outcome(&outcome)?;
    debug!(
        converged = outcome.converged(),
        minimum = outcome.minimum,
        "fit finished"
    );

    Ok(FitReport { result, outcome })
}

/// Compare an analytic gradient of `loss` at `point` against central finite differences.
pub fn check_gradient<L>(loss: &L, point: &Array1<f64>, analytic: &Array1<f64>) -> Result<GradientCheck>
where
    L: Objective,
{
    utils::check_gradient(|x| loss.cost(x), point, analytic, None)
}
