//! Result of a minimization run.

use ndarray::Array1;
use std::fmt;

/// How a minimization run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The solver's own convergence criterion was met.
    Converged,

    /// The target cost was reached.
    TargetCostReached,

    /// The iteration cap was hit before convergence.
    MaxIterationsReached,

    /// The solver stopped for another reason, given as text.
    Stopped(String),
}

impl ConvergenceStatus {
    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::Converged | ConvergenceStatus::TargetCostReached
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> String {
        match self {
            ConvergenceStatus::Converged => "Converged".to_string(),
            ConvergenceStatus::TargetCostReached => "Converged: target cost reached".to_string(),
            ConvergenceStatus::MaxIterationsReached => {
                "Terminated: maximum iterations reached".to_string()
            }
            ConvergenceStatus::Stopped(reason) => format!("Terminated: {}", reason),
        }
    }
}

impl fmt::Display for ConvergenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// What a minimizer reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeOutcome {
    pub minimizer: Array1<f64>,
    pub minimum: f64,
    pub iterations: u64,
    pub cost_evals: u64,
    pub gradient_evals: u64,
    pub status: ConvergenceStatus,
}

impl MinimizeOutcome {
    /// The best point found, in the optimizable representation.
    pub fn minimizer(&self) -> &Array1<f64> {
        &self.minimizer
    }

    /// The loss at [`minimizer`](Self::minimizer).
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn converged(&self) -> bool {
        self.status.is_converged()
    }
}

impl fmt::Display for MinimizeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Minimum: {:.6e}", self.minimum)?;
        writeln!(f, "Iterations: {}", self.iterations)?;
        write!(
            f,
            "Evaluations: {} cost, {} gradient",
            self.cost_evals, self.gradient_evals
        )
    }
}
