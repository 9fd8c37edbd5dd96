//! # Parameter System
//!
//! Named parameters declared with one of three treatments:
//!
//! - **Free**: optimized directly
//! - **Fixed**: held at the declared value, never seen by the optimizer
//! - **Positive**: optimized as its element-wise square root, so the value
//!   handed to the model is always non-negative
//!
//! ## Core Components
//!
//! - [`Annotation`] and [`Constraint`]: the declared value with its treatment,
//!   and the internal/external transform pair for each treatment
//! - [`ParameterSet`]: the ordered declaration of every parameter
//! - [`KeyedVector`] and [`Layout`]: flat buffers addressed by name, used for
//!   the optimizable vector, the fixed vector and raw results
//! - [`NamedValues`]: results in external form
//!
//! ## Example Usage
//!
//! ```rust
//! use reparam_rs::parameters::ParameterSet;
//!
//! let params = ParameterSet::new()
//!     .positive("sigma", 0.5).unwrap()
//!     .fixed("offset", 1.0).unwrap()
//!     .free("weights", vec![0.1, 0.2, 0.3]).unwrap();
//!
//! assert_eq!(params.optimizable_len(), 4);
//! ```

pub mod annotation;
pub mod keyed;
pub mod set;

// Re-export key types
pub use annotation::{Annotation, Constraint, IntoValue, Value};
pub use keyed::{KeyedVector, Layout, NamedValues};
pub use set::ParameterSet;
