//! Integration tests for the parameter system
//!
//! These tests verify declaring, splitting and rebuilding parameters.


// Tests for split and the result builder
mod split_tests;
