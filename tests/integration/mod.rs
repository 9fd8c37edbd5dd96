//! Integration tests for the reparam-rs library
//!
//! This module organizes tests that exercise the library as a whole,
//! rather than individual components.

// Fits running the full split -> adapter -> loss -> driver -> builder flow
pub mod end_to_end;

// Models with complex output and masked embeddings
pub mod complex_models;
