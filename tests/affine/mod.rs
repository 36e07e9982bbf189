//! Integration tests for affine decompositions

// Freezing against independently computed references
mod freeze_tests;

// Registration, copying and sharing of components
mod registration_tests;

// Concurrent readers of a fully built decomposition
mod concurrency_tests;
