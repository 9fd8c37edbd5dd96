//! Stock minimizer backed by the `argmin` crate.

use super::{Algorithm, ConvergenceStatus, MinimizeOutcome, Minimizer, Objective, OptimizeOptions};
use crate::error::{ReparamError, Result};
use argmin::core::{
    CostFunction, Error as ArgminError, Executor, Gradient, IterState, Solver, State,
    TerminationReason, TerminationStatus,
};
use argmin::solver::gradientdescent::SteepestDescent;
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::neldermead::NelderMead;
use argmin::solver::quasinewton::{BFGS, LBFGS};
use ndarray::{Array1, Array2};
use tracing::trace;

type Point = Array1<f64>;
type MoreThuente = MoreThuenteLineSearch<Point, Point, f64>;
type GradientState = IterState<Point, Point, (), (), (), f64>;
type BfgsState = IterState<Point, Point, (), Array2<f64>, (), f64>;
type SimplexState = IterState<Point, (), (), (), (), f64>;

/// Smallest relative drop in the best cost that justifies another simplex restart.
const RESTART_TOLERANCE: f64 = 1.490_116_119_384_765_6e-8;

/// Exposes an [`Objective`] as an `argmin` problem.
#[derive(Clone, Copy)]
pub(crate) struct ArgminProblem<'a> {
    objective: &'a dyn Objective,
    epsilon: Option<f64>,
}

impl CostFunction for ArgminProblem<'_> {
    type Param = Point;
    type Output = f64;

    fn cost(&self, param: &Point) -> std::result::Result<f64, ArgminError> {
        let value = self.objective.cost(param)?;
        if !value.is_finite() {
            return Err(ReparamError::FunctionEvaluation(format!(
                "loss evaluated to {} at {}",
                value, param
            ))
            .into());
        }
        trace!(cost = value, "evaluated loss");
        Ok(value)
    }
}

impl Gradient for ArgminProblem<'_> {
    type Param = Point;
    type Gradient = Point;

    fn gradient(&self, param: &Point) -> std::result::Result<Point, ArgminError> {
        let gradient = self.objective.gradient(param, self.epsilon)?;
        if gradient.len() != param.len() {
            return Err(ReparamError::DimensionMismatch(format!(
                "Expected gradient of length {}, got {}",
                param.len(),
                gradient.len()
            ))
            .into());
        }
        if gradient.iter().any(|g| !g.is_finite()) {
            return Err(ReparamError::FunctionEvaluation(format!(
                "non-finite gradient at {}",
                param
            ))
            .into());
        }
        Ok(gradient)
    }
}

/// The default [`Minimizer`], running one of the `argmin` solvers named by
/// [`Algorithm`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgminMinimizer;

impl ArgminMinimizer {
    pub fn new() -> Self {
        Self
    }
}

impl Minimizer for ArgminMinimizer {
    fn minimize(
        &self,
        objective: &dyn Objective,
        start: Array1<f64>,
        options: &OptimizeOptions,
    ) -> Result<MinimizeOutcome> {
        let problem = ArgminProblem {
            objective,
            epsilon: options.fd_epsilon,
        };
        let iterations = options.iterations;

        match options.algorithm {
            Algorithm::Lbfgs => {
                let mut solver = LBFGS::new(MoreThuente::new(), options.lbfgs_memory);
                if let Some(tol) = options.tol_grad {
                    solver = solver.with_tolerance_grad(tol).map_err(into_reparam)?;
                }
                if let Some(tol) = options.tol_cost {
                    solver = solver.with_tolerance_cost(tol).map_err(into_reparam)?;
                }
                execute(problem, solver, |state: GradientState| {
                    state.param(start).max_iters(iterations)
                })
            }
            Algorithm::Bfgs => {
                let n = start.len();
                let mut solver = BFGS::new(MoreThuente::new());
                if let Some(tol) = options.tol_grad {
                    solver = solver.with_tolerance_grad(tol).map_err(into_reparam)?;
                }
                if let Some(tol) = options.tol_cost {
                    solver = solver.with_tolerance_cost(tol).map_err(into_reparam)?;
                }
                execute(problem, solver, |state: BfgsState| {
                    state
                        .param(start)
                        .inv_hessian(Array2::eye(n))
                        .max_iters(iterations)
                })
            }
            Algorithm::SteepestDescent => {
                let solver = SteepestDescent::new(MoreThuente::new());
                execute(problem, solver, |state: GradientState| {
                    state.param(start).max_iters(iterations)
                })
            }
            Algorithm::NelderMead => minimize_simplex(problem, start, options),
        }
    }
}

/// Nelder-Mead, restarted around the best vertex after each stop.
///
/// argmin stops once the vertex costs agree, which also happens when the
/// simplex straddles a minimum with equal costs on both sides. A stop only
/// counts as converged when a fresh simplex no longer lowers the best cost.
fn minimize_simplex(
    problem: ArgminProblem<'_>,
    start: Point,
    options: &OptimizeOptions,
) -> Result<MinimizeOutcome> {
    let threshold = options.tol_cost.unwrap_or(0.0).max(RESTART_TOLERANCE);
    let mut point = start;
    let mut previous: Option<f64> = None;
    let mut iterations = 0;
    let mut cost_evals = 0;

    loop {
        let remaining = options.iterations.saturating_sub(iterations);
        let mut solver = NelderMead::new(initial_simplex(&point));
        if let Some(tol) = options.tol_cost {
            solver = solver.with_sd_tolerance(tol).map_err(into_reparam)?;
        }
        let run = execute(problem, solver, |state: SimplexState| {
            state.max_iters(remaining)
        })?;
        iterations += run.iterations;
        cost_evals += run.cost_evals;

        let settled = run.iterations == 0
            || previous.map_or(false, |best| {
                best - run.minimum <= threshold * (1.0 + run.minimum.abs())
            });
        let status = match run.status {
            ConvergenceStatus::Converged if settled => ConvergenceStatus::Converged,
            ConvergenceStatus::Converged if iterations >= options.iterations => {
                ConvergenceStatus::MaxIterationsReached
            }
            ConvergenceStatus::Converged => {
                trace!(minimum = run.minimum, iterations, "restarting simplex");
                previous = Some(run.minimum);
                point = run.minimizer;
                continue;
            }
            other => other,
        };

        return Ok(MinimizeOutcome {
            minimizer: run.minimizer,
            minimum: run.minimum,
            iterations,
            cost_evals,
            gradient_evals: 0,
            status,
        });
    }
}

/// Start point plus one vertex per coordinate, displaced by 5% of the
/// coordinate (or 0.00025 where it is zero).
fn initial_simplex(start: &Point) -> Vec<Point> {
    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(start.clone());
    for i in 0..start.len() {
        let mut vertex = start.clone();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * 1.05
        } else {
            0.000_25
        };
        simplex.push(vertex);
    }
    simplex
}

fn execute<'a, S, I>(
    problem: ArgminProblem<'a>,
    solver: S,
    init: impl FnOnce(I) -> I,
) -> Result<MinimizeOutcome>
where
    S: Solver<ArgminProblem<'a>, I>,
    I: State<Param = Point, Float = f64>,
{
    let result = Executor::new(problem, solver)
        .configure(init)
        .run()
        .map_err(into_reparam)?;
    let state = result.state();

    let minimizer = state.get_best_param().cloned().ok_or_else(|| {
        ReparamError::OptimizationFailure("solver finished without a best point".to_string())
    })?;
    let counts = state.get_func_counts();

    Ok(MinimizeOutcome {
        minimizer,
        minimum: state.get_best_cost(),
        iterations: state.get_iter(),
        cost_evals: counts.get("cost_count").copied().unwrap_or(0),
        gradient_evals: counts.get("gradient_count").copied().unwrap_or(0),
        status: status_of(state.get_termination_status()),
    })
}

fn status_of(status: &TerminationStatus) -> ConvergenceStatus {
    match status {
        TerminationStatus::Terminated(TerminationReason::SolverConverged) => {
            ConvergenceStatus::Converged
        }
        TerminationStatus::Terminated(TerminationReason::TargetCostReached) => {
            ConvergenceStatus::TargetCostReached
        }
        TerminationStatus::Terminated(TerminationReason::MaxItersReached) => {
            ConvergenceStatus::MaxIterationsReached
        }
        TerminationStatus::Terminated(reason) => ConvergenceStatus::Stopped(format!("{:?}", reason)),
        TerminationStatus::NotTerminated => ConvergenceStatus::Stopped("not terminated".to_string()),
    }
}

/// Recover crate errors raised inside the problem; anything else is a backend failure.
fn into_reparam(err: ArgminError) -> ReparamError {
    match err.downcast::<ReparamError>() {
        Ok(inner) => inner,
        Err(other) => ReparamError::OptimizationFailure(other.to_string()),
    }
}
