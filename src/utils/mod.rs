//! Utility functions and helpers for the reparam-rs library.

pub mod finite_difference;

pub use finite_difference::{check_gradient, gradient, GradientCheck};
