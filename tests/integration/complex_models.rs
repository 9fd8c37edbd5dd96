//! Real parameters driving a complex-valued model through a masked embedding

use crate::test_helpers::array_approx_eq;
use ndarray::{Array1, ArrayD, IxDyn};
use num_complex::Complex64;
use reparam_rs::divergence::GaussianNorm;
use reparam_rs::embed::{CustomAdjoint, Mask, MaskedEmbed};
use reparam_rs::fit::check_gradient;
use reparam_rs::optimize::{optimize, OptimizeOptions};
use reparam_rs::parameters::{NamedValues, ParameterSet};
use reparam_rs::{make_forward, make_loss, split, ParamGetter};

struct Spectrum {
    op: MaskedEmbed<f64, Complex64>,
    phases: ArrayD<Complex64>,
}

impl Spectrum {
    fn new() -> Self {
        let mask = Mask::from(vec![false, true, false, true, true, false]);
        let phases = ArrayD::from_shape_fn(IxDyn(&[6]), |ix| {
            Complex64::from_polar(1.0, 0.7 * ix[0] as f64)
        });
        Self {
            op: MaskedEmbed::new(mask),
            phases,
        }
    }

    fn eval(&self, weights: &Array1<f64>) -> reparam_rs::Result<ArrayD<Complex64>> {
        Ok(self.op.forward(weights)? * &self.phases)
    }

    /// Gradient of `sum |model - data|^2` with respect to the real weights.
    fn weight_gradient(
        &self,
        weights: &Array1<f64>,
        data: &ArrayD<Complex64>,
    ) -> reparam_rs::Result<Array1<f64>> {
        let residual = self.eval(weights)? - data;
        // d/dRe(z) + i d/dIm(z) of the squared modulus, per embedded entry
        let upstream = (self.phases.mapv(|p| p.conj()) * residual).mapv(|g| g * 2.0);
        Ok(self.op.pullback(&upstream)?.vector)
    }
}

#[test]
fn test_fit_real_weights_against_complex_data() {
    let spectrum = Spectrum::new();
    let truth = ndarray::array![1.0, 0.5, 2.0];
    let data = spectrum.eval(&truth).unwrap();

    let params = ParameterSet::new()
        .positive("weights", vec![1.0, 1.0, 1.0])
        .unwrap();
    let parts = split(&params).unwrap();
    let (forward, _) = make_forward(|p: &ParamGetter<'_>| spectrum.eval(&p.vector("weights")?), &parts);
    let loss = make_loss(data, forward, GaussianNorm::default());

    let outcome = optimize(&loss, parts.optimizable.as_flat(), &OptimizeOptions::default()).unwrap();
    let result = parts.builder.build_from_outcome(&outcome).unwrap();
    let fitted = Array1::from_iter(result.external.get("weights").unwrap().iter().copied());
    assert!(array_approx_eq(&fitted, &truth, 1e-4), "{} vs {}", fitted, truth);
}

#[test]
fn test_pullback_chain_matches_finite_differences() {
    let spectrum = Spectrum::new();
    let data = spectrum.eval(&ndarray::array![1.0, 0.5, 2.0]).unwrap();

    let params = ParameterSet::new()
        .positive("weights", vec![0.3, 1.7, 0.9])
        .unwrap();
    let parts = split(&params).unwrap();
    let (forward, backward) =
        make_forward(|p: &ParamGetter<'_>| spectrum.eval(&p.vector("weights")?), &parts);
    let loss = make_loss(data.clone(), forward, GaussianNorm::default());

    // Gradient in external weights, then through the square-root reparameterization.
    let point = parts.optimizable.as_flat().clone();
    let external = backward.eval(&point).unwrap();
    let weights = Array1::from_iter(external.get("weights").unwrap().iter().copied());
    let grad_weights = spectrum.weight_gradient(&weights, &data).unwrap();

    let named = NamedValues::new().with("weights", grad_weights);
    let analytic = backward.internal_gradient(&point, &named).unwrap();

    let check = check_gradient(&loss, &point, &analytic).unwrap();
    assert!(check.passes(1e-6), "{:?}", check);
}
