//! Integration tests for the parameter system
//!
//! These tests verify that the parameter system behaves correctly in various scenarios.


// Tests for the Parametric registry
mod parametric_tests;

// Tests for coefficient functionals and their expressions
mod functional_tests;
