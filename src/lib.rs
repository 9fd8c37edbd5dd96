//! # reparam-rs
//!
//! `reparam-rs` fits parametric models to data with gradient-based
//! optimizers while keeping parameter constraints out of the model code.
//!
//! The library provides:
//! - A parameter system where each parameter is free, fixed or positive
//! - A splitter that turns declared parameters into an optimizable vector,
//!   a fixed vector and a builder that maps raw results back to named values
//! - Forward/backward adapters so models are written against external values
//! - A loss composer and an optimization driver backed by `argmin`
//! - A masked embedding operator with a hand-written adjoint, supporting real
//!   vectors embedded into complex arrays
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::{array, Array1};
//! use reparam_rs::divergence::GaussianNorm;
//! use reparam_rs::optimize::{optimize, OptimizeOptions};
//! use reparam_rs::parameters::ParameterSet;
//! use reparam_rs::{make_forward, make_loss, split};
//!
//! // y = amplitude * exp(-rate * t), both parameters kept positive
//! let t: Array1<f64> = Array1::linspace(0.0, 4.0, 20);
//! let y = t.mapv(|t| 2.0 * (-0.7 * t).exp());
//!
//! let params = ParameterSet::new()
//!     .positive("amplitude", 1.0).unwrap()
//!     .positive("rate", 1.0).unwrap();
//! let parts = split(&params).unwrap();
//!
//! let (forward, _) = make_forward(
//!     |p| {
//!         let a = p.scalar("amplitude")?;
//!         let k = p.scalar("rate")?;
//!         Ok(t.mapv(|t| a * (-k * t).exp()))
//!     },
//!     &parts,
//! );
//! let loss = make_loss(y, forward, GaussianNorm::default());
//!
//! let outcome = optimize(&loss, parts.optimizable.as_flat(), &OptimizeOptions::default()).unwrap();
//! let result = parts.builder.build_from_outcome(&outcome).unwrap();
//!
//! assert!((result.external.scalar("rate").unwrap() - 0.7).abs() < 1e-4);
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

pub mod adapter;
pub mod divergence;
pub mod embed;
pub mod fit;
pub mod loss;
pub mod optimize;
pub mod split;
pub mod utils;

// Re-exports for convenience
pub use adapter::{make_forward, Backward, Forward, ParamGetter};
pub use embed::{embed, embed_into, embed_pullback, Mask, MaskedEmbed};
pub use error::{ReparamError, Result};
pub use fit::{fit, FitReport};
pub use loss::{make_loss, Loss};
pub use optimize::{optimize, MinimizeOutcome, OptimizeOptions};
pub use split::{split, FitResult, ResultBuilder, Split};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
