//! End-to-end fitting scenarios

use crate::test_helpers::{init_tracing, rng};
use approx::assert_relative_eq;
use ndarray::{array, Array1};
use rand::Rng;
use reparam_rs::divergence::{GaussianNorm, RobustNorm};
use reparam_rs::optimize::{optimize, Algorithm, OptimizeOptions};
use reparam_rs::parameters::ParameterSet;
use reparam_rs::{fit, make_forward, make_loss, split, ParamGetter};

/// y = amplitude * exp(-rate * t) + offset
fn decay(p: &ParamGetter<'_>, t: &Array1<f64>) -> reparam_rs::Result<Array1<f64>> {
    let amplitude = p.scalar("amplitude")?;
    let rate = p.scalar("rate")?;
    let offset = p.scalar("offset")?;
    Ok(t.mapv(|t| amplitude * (-rate * t).exp() + offset))
}

#[test]
fn test_exponential_decay_with_positive_and_fixed_parameters() {
    init_tracing();
    let t: Array1<f64> = Array1::linspace(0.0, 5.0, 40);
    let y = t.mapv(|t| 3.0 * (-0.8 * t).exp() + 0.25);

    let params = ParameterSet::new()
        .positive("amplitude", 1.0)
        .unwrap()
        .positive("rate", 2.0)
        .unwrap()
        .fixed("offset", 0.25)
        .unwrap();
    let parts = split(&params).unwrap();
    assert_eq!(parts.optimizable.len(), 2);

    let (forward, backward) = make_forward(|p| decay(p, &t), &parts);
    let loss = make_loss(y, forward, GaussianNorm::default());
    let outcome = optimize(&loss, parts.optimizable.as_flat(), &OptimizeOptions::default()).unwrap();

    let result = parts.builder.build_from_outcome(&outcome).unwrap();
    assert!(outcome.converged(), "{}", outcome);
    assert_relative_eq!(result.external.scalar("amplitude").unwrap(), 3.0, epsilon = 1e-4);
    assert_relative_eq!(result.external.scalar("rate").unwrap(), 0.8, epsilon = 1e-4);
    assert_eq!(result.external.scalar("offset").unwrap(), 0.25);

    // The backward adapter agrees with the result builder.
    assert_eq!(backward.eval(outcome.minimizer()).unwrap(), result.external);
}

#[test]
fn test_positive_parameter_stays_non_negative_when_data_pulls_below_zero() {
    // Best unconstrained fit would be a negative level.
    let y = array![-1.0, -2.0, -1.5];
    let params = ParameterSet::new().positive("level", 1.0).unwrap();

    let report = fit(
        |p| Ok(Array1::from_elem(3, p.scalar("level")?)),
        &params,
        y,
        GaussianNorm::default(),
        &OptimizeOptions::new().with_algorithm(Algorithm::NelderMead),
    )
    .unwrap();

    let level = report.scalar("level").unwrap();
    assert!(level >= 0.0);
    assert!(level < 1e-3, "level should approach the boundary, got {}", level);
}

#[test]
fn test_array_parameters_fit() {
    let x: Array1<f64> = Array1::linspace(-1.0, 1.0, 25);
    let truth: Array1<f64> = array![0.5, -1.0, 2.0];
    let y = x.mapv(|x| truth[0] + truth[1] * x + truth[2] * x * x);

    let params = ParameterSet::new()
        .free("coefficients", vec![0.0, 0.0, 0.0])
        .unwrap();
    let report = fit(
        |p| {
            let c = p.vector("coefficients")?;
            Ok(x.mapv(|x| c[0] + c[1] * x + c[2] * x * x))
        },
        &params,
        y,
        GaussianNorm::default(),
        &OptimizeOptions::default(),
    )
    .unwrap();

    let fitted = report.parameters().get("coefficients").unwrap();
    for (f, t) in fitted.iter().zip(truth.iter()) {
        assert_relative_eq!(*f, *t, epsilon = 1e-5);
    }
}

#[test]
fn test_robust_fit_resists_outliers() {
    let mut generator = rng(42);
    let x: Array1<f64> = Array1::linspace(0.0, 10.0, 50);
    let mut y = x.mapv(|x| 2.0 * x + 1.0 + generator.gen_range(-0.05_f64..0.05));
    y[10] += 40.0;
    y[30] -= 60.0;

    let params = ParameterSet::new()
        .free("slope", 1.0)
        .unwrap()
        .free("intercept", 0.0)
        .unwrap();
    let model = |p: &ParamGetter<'_>| -> reparam_rs::Result<Array1<f64>> {
        let slope = p.scalar("slope")?;
        let intercept = p.scalar("intercept")?;
        Ok(x.mapv(|x| slope * x + intercept))
    };
    let options = OptimizeOptions::new()
        .with_algorithm(Algorithm::NelderMead)
        .with_iterations(2000)
        .with_tol_cost(1e-12);

    let robust = fit(model, &params, y.clone(), RobustNorm::SoftL1, &options).unwrap();
    let plain = fit(model, &params, y, GaussianNorm::default(), &options).unwrap();

    let robust_error = (robust.scalar("slope").unwrap() - 2.0).abs();
    let plain_error = (plain.scalar("slope").unwrap() - 2.0).abs();
    assert!(robust_error < 0.05, "robust slope error {}", robust_error);
    assert!(robust_error < plain_error);
}

#[test]
fn test_report_display_lists_every_parameter() {
    let params = ParameterSet::new()
        .free("a", 1.0)
        .unwrap()
        .fixed("b", 2.0)
        .unwrap();
    let report = fit(
        |p| Ok(p.scalar("a")? + p.scalar("b")?),
        &params,
        5.0,
        |d: &f64, o: &f64| -> reparam_rs::Result<f64> { Ok((d - o).powi(2)) },
        &OptimizeOptions::default(),
    )
    .unwrap();

    assert_relative_eq!(report.scalar("a").unwrap(), 3.0, epsilon = 1e-5);
    let text = report.to_string();
    assert!(text.contains("a:"));
    assert!(text.contains("b:"));
}
