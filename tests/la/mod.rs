//! Integration tests for the linear containers

// Sparse pattern-union assembly against dense references
mod sparse_assembly_tests;
