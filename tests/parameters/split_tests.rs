//! Tests for splitting parameter sets and rebuilding results

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use reparam_rs::parameters::{Constraint, ParameterSet};
use reparam_rs::{split, ReparamError};

fn mixed() -> ParameterSet {
    ParameterSet::new()
        .positive("amplitude", 9.0)
        .unwrap()
        .fixed("center", 0.5)
        .unwrap()
        .free("shift", vec![-1.0, 1.0])
        .unwrap()
        .fixed("scale", vec![2.0, 3.0, 4.0])
        .unwrap()
        .positive("width", vec![0.25, 4.0])
        .unwrap()
}

#[test]
fn test_partition_is_complete_and_disjoint() {
    let params = mixed();
    let parts = split(&params).unwrap();

    for name in params.names() {
        let in_optimizable = parts.optimizable.contains(name);
        let in_fixed = parts.fixed.contains(name);
        assert!(in_optimizable ^ in_fixed, "{} must land in exactly one side", name);
        assert_eq!(
            in_fixed,
            params.constraint(name) == Some(Constraint::Fixed),
            "{}",
            name
        );
    }
    assert_eq!(parts.optimizable.len(), params.optimizable_len());
}

#[test]
fn test_internal_representation() {
    let parts = split(&mixed()).unwrap();
    assert_eq!(
        parts.optimizable.as_flat(),
        &array![3.0, -1.0, 1.0, 0.5, 2.0]
    );
    assert_eq!(parts.optimizable.names().collect::<Vec<_>>(), vec!["amplitude", "shift", "width"]);
}

#[test]
fn test_fixed_values_pass_through_unchanged() {
    let params = mixed();
    let parts = split(&params).unwrap();

    // Any raw point leaves fixed values exactly as declared.
    let raw = array![-7.0, 100.0, -100.0, 0.0, 1e3];
    let result = parts.builder.build_flat(&raw).unwrap();
    assert_eq!(result.external.get("center"), params.get("center").map(|a| a.value()));
    assert_eq!(result.external.get("scale"), params.get("scale").map(|a| a.value()));
    assert_eq!(parts.builder.fixed(), &parts.fixed);
}

#[test]
fn test_start_point_round_trips() {
    let params = mixed();
    let parts = split(&params).unwrap();
    let result = parts.builder.build(&parts.optimizable).unwrap();

    assert_eq!(result.external.names().collect::<Vec<_>>(), params.names().collect::<Vec<_>>());
    for (name, annotation) in params.iter() {
        let rebuilt = result.external.get(name).unwrap();
        for (a, b) in rebuilt.iter().zip(annotation.value().iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_positive_results_are_never_negative() {
    let parts = split(&mixed()).unwrap();
    let result = parts
        .builder
        .build_flat(&array![-2.0, 0.0, 0.0, -0.5, -3.0])
        .unwrap();
    assert_relative_eq!(result.external.scalar("amplitude").unwrap(), 4.0);
    assert!(result.external.get("width").unwrap().iter().all(|&w| w >= 0.0));
}

#[test]
fn test_split_rejects_negative_positive_declaration() {
    let params = ParameterSet::new().positive("w", vec![1.0, -0.1]).unwrap();
    assert!(matches!(
        split(&params),
        Err(ReparamError::DomainViolation { ref name, .. }) if name == "w"
    ));
}

#[test]
fn test_all_fixed() {
    let params = ParameterSet::new().fixed("a", 1.0).unwrap();
    let parts = split(&params).unwrap();
    assert!(parts.optimizable.is_empty());
    let result = parts.builder.build_flat(&Array1::zeros(0)).unwrap();
    assert_eq!(result.external.scalar("a").unwrap(), 1.0);
}
