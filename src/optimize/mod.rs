//! Optimization driver.
//!
//! [`optimize`] hands a scalar [`Objective`] and a start point to a
//! [`Minimizer`] and returns what the minimizer reports. The stock minimizer
//! is [`ArgminMinimizer`]; any other backend can be plugged in through
//! [`optimize_with`].

pub mod argmin_backend;
pub mod config;
pub mod outcome;

pub use argmin_backend::ArgminMinimizer;
pub use config::{Algorithm, OptimizeOptions, DEFAULT_LBFGS_MEMORY};
pub use outcome::{ConvergenceStatus, MinimizeOutcome};

use crate::error::{ReparamError, Result};
use crate::utils::finite_difference;
use ndarray::Array1;
use tracing::{debug, warn};

/// A scalar function of a flat parameter vector.
pub trait Objective {
    /// Length of the vectors the objective accepts.
    fn dim(&self) -> usize;

    /// Evaluate the objective.
    fn cost(&self, point: &Array1<f64>) -> Result<f64>;

    /// Gradient of the objective; central finite differences unless overridden.
    fn gradient(&self, point: &Array1<f64>, epsilon: Option<f64>) -> Result<Array1<f64>> {
        finite_difference::gradient(|x| self.cost(x), point, epsilon)
    }
}

/// An external minimization routine.
pub trait Minimizer {
    /// Minimize `objective` starting at `start`.
    ///
    /// Running out of iterations is not an error; it is reported through
    /// [`MinimizeOutcome::status`].
    fn minimize(
        &self,
        objective: &dyn Objective,
        start: Array1<f64>,
        options: &OptimizeOptions,
    ) -> Result<MinimizeOutcome>;
}

/// Minimize a loss with the stock minimizer
///
/// # Arguments
///
/// * `loss` - The objective, typically from [`make_loss`](crate::make_loss)
/// * `start` - Starting point in the optimizable representation
/// * `options` - Solver choice, iteration cap and tolerances
///
/// # Returns
///
/// The minimizer's outcome, or `DimensionMismatch` if `start` does not match
/// the loss before any evaluation happens
pub fn optimize<L>(loss: &L, start: &Array1<f64>, options: &OptimizeOptions) -> Result<MinimizeOutcome>
where
    L: Objective,
{
    optimize_with(&ArgminMinimizer, loss, start, options)
}

/// Minimize a loss with a caller-supplied minimizer.
pub fn optimize_with<Mz, L>(
    minimizer: &Mz,
    loss: &L,
    start: &Array1<f64>,
    options: &OptimizeOptions,
) -> Result<MinimizeOutcome>
where
    Mz: Minimizer + ?Sized,
    L: Objective,
{
    options.validate()?;
    if start.len() != loss.dim() {
        return Err(ReparamError::DimensionMismatch(format!(
            "Start point has {} values but the loss expects {}",
            start.len(),
            loss.dim()
        )));
    }

    if start.is_empty() {
        let minimum = loss.cost(start)?;
        debug!(minimum, "nothing to optimize");
        return Ok(MinimizeOutcome {
            minimizer: start.clone(),
            minimum,
            iterations: 0,
            cost_evals: 1,
            gradient_evals: 0,
            status: ConvergenceStatus::Converged,
        });
    }

    debug!(
        algorithm = %options.algorithm,
        dim = start.len(),
        iterations = options.iterations,
        "starting optimization"
    );
    let outcome = minimizer.minimize(loss, start.clone(), options)?;

    if outcome.converged() {
        debug!(
            minimum = outcome.minimum,
            iterations = outcome.iterations,
            "optimization converged"
        );
    } else {
        warn!(
            status = %outcome.status,
            minimum = outcome.minimum,
            iterations = outcome.iterations,
            "optimization did not converge"
        );
    }
    Ok(outcome)
}
