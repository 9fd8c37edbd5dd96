//! Integration tests for the optimization driver

use crate::test_helpers::init_tracing;
use approx::assert_relative_eq;
use ndarray::{array, Array1};
use reparam_rs::divergence::GaussianNorm;
use reparam_rs::optimize::{
    optimize, optimize_with, Algorithm, ArgminMinimizer, ConvergenceStatus, Objective,
    OptimizeOptions,
};
use reparam_rs::parameters::ParameterSet;
use reparam_rs::{make_forward, make_loss, split, ReparamError};

/// Rosenbrock function, minimum 0 at (1, 1)
struct Rosenbrock;

impl Objective for Rosenbrock {
    fn dim(&self) -> usize {
        2
    }

    fn cost(&self, x: &Array1<f64>) -> reparam_rs::Result<f64> {
        Ok((1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2))
    }

    fn gradient(&self, x: &Array1<f64>, _epsilon: Option<f64>) -> reparam_rs::Result<Array1<f64>> {
        Ok(array![
            -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]),
            200.0 * (x[1] - x[0] * x[0])
        ])
    }
}

#[test]
fn test_rosenbrock_with_analytic_gradient() {
    init_tracing();
    for algorithm in [Algorithm::Lbfgs, Algorithm::Bfgs] {
        let options = OptimizeOptions::new()
            .with_algorithm(algorithm)
            .with_iterations(500);
        let outcome = optimize(&Rosenbrock, &array![-1.2, 1.0], &options).unwrap();
        assert!(outcome.converged(), "{}: {}", algorithm, outcome.status);
        assert_relative_eq!(outcome.minimizer()[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(outcome.minimizer()[1], 1.0, epsilon = 1e-4);
    }
}

#[test]
fn test_outcome_reports_counts() {
    let outcome = optimize(&Rosenbrock, &array![-1.2, 1.0], &OptimizeOptions::default()).unwrap();
    assert!(outcome.iterations > 0);
    assert!(outcome.cost_evals > 0);
    assert!(outcome.gradient_evals > 0);
}

#[test]
fn test_non_convergence_is_reported_not_raised() {
    let options = OptimizeOptions::new()
        .with_algorithm(Algorithm::NelderMead)
        .with_iterations(3);
    let outcome = optimize(&Rosenbrock, &array![-1.2, 1.0], &options).unwrap();
    assert_eq!(outcome.status, ConvergenceStatus::MaxIterationsReached);
    assert!(!outcome.converged());
}

#[test]
fn test_driver_checks_start_length_before_evaluating() {
    let params = ParameterSet::new()
        .free("a", 1.0)
        .unwrap()
        .positive("b", 1.0)
        .unwrap();
    let parts = split(&params).unwrap();
    let (forward, _) = make_forward(
        |_p| -> reparam_rs::Result<f64> { panic!("model must not run") },
        &parts,
    );
    let loss = make_loss(0.0, forward, |d: &f64, o: &f64| -> reparam_rs::Result<f64> {
        Ok((d - o).abs())
    });

    let result = optimize_with(
        &ArgminMinimizer::new(),
        &loss,
        &array![1.0, 2.0, 3.0],
        &OptimizeOptions::default(),
    );
    assert!(matches!(result, Err(ReparamError::DimensionMismatch(_))));
}

#[test]
fn test_options_from_json_drive_the_solver() {
    let params = ParameterSet::new().free("c", 10.0).unwrap();
    let parts = split(&params).unwrap();
    let (forward, _) = make_forward(|p| Ok(array![p.scalar("c")?]), &parts);
    let loss = make_loss(array![-4.0], forward, GaussianNorm::default());

    let options = OptimizeOptions::from_json(
        r#"{ "algorithm": "nelder_mead", "iterations": 500, "tol_cost": 1e-12 }"#,
    )
    .unwrap();
    let outcome = optimize(&loss, parts.optimizable.as_flat(), &options).unwrap();
    assert_relative_eq!(outcome.minimizer()[0], -4.0, epsilon = 1e-4);
}
