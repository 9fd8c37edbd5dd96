//! Configuration options for the optimization driver.

use crate::error::{ReparamError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::str::FromStr;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEMORY: usize = 7;

/// Solver used by the stock minimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Limited-memory BFGS with More-Thuente line search
    Lbfgs,

    /// BFGS with More-Thuente line search
    Bfgs,

    /// Derivative-free Nelder-Mead simplex
    NelderMead,

    /// Steepest descent with More-Thuente line search
    SteepestDescent,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Lbfgs
    }
}

impl Algorithm {
    /// Whether the solver consumes gradients.
    pub fn uses_gradient(&self) -> bool {
        !matches!(self, Algorithm::NelderMead)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Lbfgs => write!(f, "L-BFGS"),
            Algorithm::Bfgs => write!(f, "BFGS"),
            Algorithm::NelderMead => write!(f, "Nelder-Mead"),
            Algorithm::SteepestDescent => write!(f, "steepest descent"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = ReparamError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "lbfgs" => Ok(Algorithm::Lbfgs),
            "bfgs" => Ok(Algorithm::Bfgs),
            "neldermead" => Ok(Algorithm::NelderMead),
            "steepestdescent" | "gradientdescent" => Ok(Algorithm::SteepestDescent),
            _ => Err(ReparamError::InvalidOptions(format!(
                "Unknown algorithm '{}'",
                s
            ))),
        }
    }
}

/// Options for [`optimize`](super::optimize).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeOptions {
    /// Maximum number of iterations. Default: 100
    pub iterations: u64,

    /// Solver. Default: L-BFGS
    pub algorithm: Algorithm,

    /// Gradient-norm tolerance for the quasi-Newton solvers. Default: solver default
    pub tol_grad: Option<f64>,

    /// Cost-change tolerance (simplex standard deviation for Nelder-Mead).
    /// Default: solver default
    pub tol_cost: Option<f64>,

    /// L-BFGS history size. Default: 7
    pub lbfgs_memory: usize,

    /// Relative step for finite-difference gradients. Default: cbrt(machine epsilon)
    pub fd_epsilon: Option<f64>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            iterations: 100,
            algorithm: Algorithm::default(),
            tol_grad: None,
            tol_cost: None,
            lbfgs_memory: DEFAULT_LBFGS_MEMORY,
            fd_epsilon: None,
        }
    }
}

impl OptimizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_tol_grad(mut self, tol: f64) -> Self {
        self.tol_grad = Some(tol);
        self
    }

    pub fn with_tol_cost(mut self, tol: f64) -> Self {
        self.tol_cost = Some(tol);
        self
    }

    /// Check the options before any solver is built.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(ReparamError::InvalidOptions(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.lbfgs_memory == 0 {
            return Err(ReparamError::InvalidOptions(
                "lbfgs_memory must be at least 1".to_string(),
            ));
        }
        for (label, value) in [
            ("tol_grad", self.tol_grad),
            ("tol_cost", self.tol_cost),
            ("fd_epsilon", self.fd_epsilon),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(ReparamError::InvalidOptions(format!(
                        "{} must be positive and finite, got {}",
                        label, v
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let options: Self = serde_json::from_reader(reader)?;
        options.validate()?;
        Ok(options)
    }
}
