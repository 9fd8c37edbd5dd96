//! Integration tests for the masked embedding operator
//!
//! Randomized checks use a seeded ChaCha generator so failures reproduce.

use crate::test_helpers::{random_vector, rng};
use approx::assert_relative_eq;
use ndarray::{Array1, ArrayD, IxDyn};
use num_complex::Complex64;
use rand::Rng;
use reparam_rs::embed::{embed, embed_into, embed_pullback, CustomAdjoint, EmbedTangents, Mask, MaskedEmbed};
use reparam_rs::utils::gradient;
use reparam_rs::ReparamError;

fn random_mask(seed: u64, shape: &[usize]) -> Mask {
    let mut rng = rng(seed);
    let cells = ArrayD::from_shape_fn(IxDyn(shape), |_| rng.gen_bool(0.4));
    Mask::new(cells)
}

#[test]
fn test_scenario_from_docs() {
    let mask = Mask::from(vec![false, true, true, false]);
    let out: ArrayD<f64> = embed(&ndarray::array![5.0, 6.0], &mask).unwrap();
    assert_eq!(out.iter().copied().collect::<Vec<_>>(), vec![0.0, 5.0, 6.0, 0.0]);
}

#[test]
fn test_embedding_correctness_on_random_masks() {
    for seed in 0..20 {
        let mask = random_mask(seed, &[3, 4, 2]);
        let mut generator = rng(seed + 1000);
        let v = random_vector(&mut generator, mask.count());

        let out: ArrayD<f64> = embed(&v, &mask).unwrap();
        assert_eq!(mask.gather(&out).unwrap(), v);
        let outside = mask.complement().gather(&out).unwrap();
        assert!(outside.iter().all(|&x| x == 0.0));
    }
}

#[test]
fn test_destination_values_survive_outside_mask() {
    let mask = random_mask(7, &[5, 5]);
    let mut generator = rng(8);
    let destination: ArrayD<f64> = ArrayD::from_shape_fn(IxDyn(&[5, 5]), |_| generator.gen_range(10.0..20.0));
    let v = random_vector(&mut generator, mask.count());

    let out = embed_into(&v, &mask, destination.clone()).unwrap();
    assert_eq!(
        mask.complement().gather(&out).unwrap(),
        mask.complement().gather(&destination).unwrap()
    );
    assert_eq!(mask.gather(&out).unwrap(), v);
}

#[test]
fn test_adjoint_matches_numerical_gradient() {
    for seed in 0..10 {
        let mask = random_mask(seed, &[4, 6]);
        let mut generator = rng(seed + 500);
        let v = random_vector(&mut generator, mask.count());
        let upstream: ArrayD<f64> = ArrayD::from_shape_fn(IxDyn(&[4, 6]), |_| generator.gen_range(-2.0..2.0));

        let f = |x: &Array1<f64>| -> reparam_rs::Result<f64> {
            let out: ArrayD<f64> = embed(x, &mask)?;
            Ok((&out * &upstream).sum())
        };
        let numerical = gradient(f, &v, None).unwrap();
        let tangents: EmbedTangents<f64> = embed_pullback(&upstream, &mask).unwrap();

        assert_eq!(tangents.vector.len(), v.len());
        for (a, n) in tangents.vector.iter().zip(numerical.iter()) {
            assert_relative_eq!(*a, *n, epsilon = 1e-7);
        }
    }
}

#[test]
fn test_complex_adjoint_is_real_and_matches_numerical_gradient() {
    let mask = random_mask(3, &[3, 3]);
    let mut generator = rng(4);
    let v = random_vector(&mut generator, mask.count());
    let upstream = ArrayD::from_shape_fn(IxDyn(&[3, 3]), |_| {
        Complex64::new(generator.gen_range(-1.0..1.0), generator.gen_range(-1.0..1.0))
    });

    // Real part of sum(embed(v) * g); its gradient in v is Re(g) at the mask.
    let f = |x: &Array1<f64>| -> reparam_rs::Result<f64> {
        let out: ArrayD<Complex64> = embed(x, &mask)?;
        Ok((&out * &upstream).sum().re)
    };
    let numerical = gradient(f, &v, None).unwrap();

    let op: MaskedEmbed<f64, Complex64> = MaskedEmbed::new(mask.clone());
    let tangents = op.pullback(&upstream).unwrap();
    for (a, n) in tangents.vector.iter().zip(numerical.iter()) {
        assert_relative_eq!(*a, *n, epsilon = 1e-7);
    }

    // Keeping the vector complex keeps the imaginary part.
    let complex: EmbedTangents<Complex64> = embed_pullback(&upstream, &mask).unwrap();
    let gathered = mask.gather(&upstream).unwrap();
    assert_eq!(complex.vector, gathered);
}

#[test]
fn test_precondition_violations_fail_fast() {
    let mask = Mask::from(vec![true, false, true]);
    let short: reparam_rs::Result<ArrayD<f64>> = embed(&ndarray::array![1.0], &mask);
    assert!(matches!(short, Err(ReparamError::DimensionMismatch(_))));

    let op: MaskedEmbed<f64, f64> = MaskedEmbed::new(mask);
    assert!(op.forward(&ndarray::array![1.0, 2.0, 3.0]).is_err());
    assert!(op.pullback(&ArrayD::zeros(IxDyn(&[4]))).is_err());
}
