use crate::test_helpers::{matrix_approx_eq, random_sparse, rng};
use affine_decomp::la::assemble_sequential;
use affine_decomp::{
    AffineError, Assemble, AssemblyConfig, CsrMatrix, LinearContainer, Prune, SparsityPattern,
};
use approx::assert_relative_eq;
use rand::Rng;

#[test]
fn test_assemble_matches_dense_reference() {
    let mut rng = rng(42);
    for _ in 0..10 {
        let nrows = rng.gen_range(1..30);
        let ncols = rng.gen_range(1..30);
        let matrices: Vec<CsrMatrix> = (0..rng.gen_range(2..6))
            .map(|_| random_sparse(&mut rng, nrows, ncols, 0.2))
            .collect();
        let weights: Vec<f64> = matrices.iter().map(|_| rng.gen_range(-2.0..2.0)).collect();
        let operands: Vec<(&CsrMatrix, f64)> = matrices.iter().zip(weights.iter().copied()).collect();

        let assembled = CsrMatrix::assemble(&operands, &AssemblyConfig::default()).unwrap();

        let mut reference = matrices[0].to_dense() * weights[0];
        for (matrix, weight) in matrices.iter().zip(&weights).skip(1) {
            reference = reference + matrix.to_dense() * *weight;
        }
        assert!(matrix_approx_eq(&assembled.to_dense(), &reference, 1e-12));

        let patterns: Vec<&SparsityPattern> = matrices.iter().map(|m| m.pattern()).collect();
        assert_eq!(assembled.pattern(), &SparsityPattern::union(&patterns).unwrap());
    }
}

#[test]
fn test_union_agrees_with_sequential_reduction() {
    let mut rng = rng(3);
    let matrices: Vec<CsrMatrix> = (0..4).map(|_| random_sparse(&mut rng, 25, 40, 0.1)).collect();
    let operands: Vec<(&CsrMatrix, f64)> = matrices.iter().zip([1.0, -0.5, 3.0, 0.25]).collect();

    let union = CsrMatrix::assemble(&operands, &AssemblyConfig::default()).unwrap();
    let sequential = assemble_sequential(&operands).unwrap();
    assert_eq!(union.pattern(), sequential.pattern());
    for (a, b) in union.values().iter().zip(sequential.values()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn test_parallel_assembly_matches_sequential() {
    let mut rng = rng(99);
    let matrices: Vec<CsrMatrix> = (0..5).map(|_| random_sparse(&mut rng, 200, 150, 0.03)).collect();
    let operands: Vec<(&CsrMatrix, f64)> = matrices
        .iter()
        .enumerate()
        .map(|(i, m)| (m, i as f64 - 2.0))
        .collect();

    let serial = CsrMatrix::assemble(
        &operands,
        &AssemblyConfig {
            parallel_rows: None,
            ..AssemblyConfig::default()
        },
    )
    .unwrap();
    let parallel = CsrMatrix::assemble(
        &operands,
        &AssemblyConfig {
            parallel_rows: Some(1),
            ..AssemblyConfig::default()
        },
    )
    .unwrap();

    // Each entry is accumulated in the same order on both paths
    assert_eq!(serial, parallel);
}

#[test]
fn test_disjoint_patterns() {
    let upper = CsrMatrix::from_triplets(3, 3, &[(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
    let lower = CsrMatrix::from_triplets(3, 3, &[(1, 0, 1.0), (2, 1, 1.0)]).unwrap();

    let sum = CsrMatrix::assemble(&[(&upper, 1.0), (&lower, 2.0)], &AssemblyConfig::default()).unwrap();
    assert_eq!(sum.nnz(), 4);
    assert_eq!(sum.get(0, 1), Some(1.0));
    assert_eq!(sum.get(2, 1), Some(2.0));
    assert_eq!(sum.get(0, 0), Some(0.0));
    assert_eq!(sum.pattern().row(1), &[0, 2]);
    assert_eq!(LinearContainer::dot(&sum, &upper).unwrap(), 2.0);
}

#[test]
fn test_cancellation_keeps_entries_until_pruned() {
    let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 4.0)]).unwrap();
    let difference = CsrMatrix::assemble(&[(&a, 1.0), (&a, -1.0)], &AssemblyConfig::default()).unwrap();
    assert_eq!(difference.nnz(), 2);
    assert_eq!(difference.l2_norm(), 0.0);
    assert_eq!(difference.pruned(0.0).nnz(), 0);
}

#[test]
fn test_mismatched_dimensions() {
    let a = CsrMatrix::zeros(2, 3);
    let b = CsrMatrix::zeros(3, 2);
    assert!(matches!(
        CsrMatrix::assemble(&[(&a, 1.0), (&b, 1.0)], &AssemblyConfig::default()),
        Err(AffineError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        CsrMatrix::assemble(&[], &AssemblyConfig::default()),
        Err(AffineError::RequirementsNotMet { .. })
    ));
}
