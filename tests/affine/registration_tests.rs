use affine_decomp::{
    AffineDecomposition, AffineError, CoefficientFunctional, CsrMatrix, Parameter, Parametrized,
};
use ndarray::{array, Array1, Array2};
use std::sync::Arc;

fn theta(key: &str) -> CoefficientFunctional {
    CoefficientFunctional::with_key(key, 1, key).unwrap()
}

#[test]
fn test_shape_mismatch_against_affine_part() {
    let mut decomp = AffineDecomposition::with_affine_part(Array2::<f64>::zeros((2, 2)));
    match decomp.register_component(Array2::<f64>::zeros((2, 3)), theta("a")) {
        Err(AffineError::ShapeMismatch { expected, actual }) => {
            assert_eq!(format!("{} vs {}", expected, actual), "matrix(2x2) vs matrix(2x3)");
        }
        other => panic!("Expected ShapeMismatch, got {:?}", other),
    }
    assert_eq!(decomp.num_components(), 0);
    assert!(!decomp.parametric());
}

#[test]
fn test_shape_mismatch_against_components() {
    let mut decomp = AffineDecomposition::new();
    decomp.register_component(array![1.0, 2.0], theta("a")).unwrap();
    assert!(matches!(
        decomp.register_component(array![1.0], theta("b")),
        Err(AffineError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        decomp.register_affine_part(array![1.0, 2.0, 3.0]),
        Err(AffineError::ShapeMismatch { .. })
    ));
    assert!(!decomp.has_affine_part());
}

#[test]
fn test_second_affine_part() {
    let mut decomp = AffineDecomposition::<Array1<f64>>::new();
    decomp.register_affine_part(array![1.0]).unwrap();
    assert!(matches!(
        decomp.register_affine_part(array![2.0]),
        Err(AffineError::AlreadyHasAffinePart)
    ));
    assert_eq!(decomp.affine_part().unwrap(), &array![1.0]);
}

#[test]
fn test_copy_is_independent() {
    let mut source = AffineDecomposition::with_affine_part(array![1.0, 1.0]);
    source.register_component(array![1.0, 0.0], theta("a")).unwrap();

    let mut copy = source.copy();
    copy.register_component(array![0.0, 1.0], theta("b")).unwrap();
    assert_eq!(source.num_components(), 1);
    assert_eq!(copy.num_components(), 2);
    assert_eq!(source.parameter_type().keys(), vec!["a"]);
    assert_eq!(copy.parameter_type().keys(), vec!["a", "b"]);

    let mu = Parameter::single("a", 2.0).unwrap();
    assert_eq!(source.freeze_parameter(&mu).unwrap(), array![3.0, 1.0]);
}

#[test]
fn test_copy_owns_fresh_containers() {
    let shared = Arc::new(CsrMatrix::identity(2));
    let mut lhs = AffineDecomposition::<CsrMatrix>::with_affine_part(Arc::clone(&shared));
    lhs.register_component(Arc::clone(&shared), theta("a")).unwrap();

    let copy = lhs.copy();
    assert!(Arc::ptr_eq(lhs.shared_component(0).unwrap(), &shared));
    assert!(!Arc::ptr_eq(copy.shared_component(0).unwrap(), &shared));
    assert!(!Arc::ptr_eq(copy.shared_affine_part().unwrap(), &shared));
    assert_eq!(copy.component(0).unwrap(), &*shared);
    assert_eq!(copy.coefficient(0).unwrap(), lhs.coefficient(0).unwrap());

    // The shallow clone shares its containers
    let clone = lhs.clone();
    assert!(Arc::ptr_eq(clone.shared_component(0).unwrap(), &shared));
}

#[test]
fn test_index_errors() {
    let mut decomp = AffineDecomposition::new();
    decomp.register_component(array![1.0], theta("a")).unwrap();
    decomp.register_component(array![2.0], theta("b")).unwrap();
    assert_eq!(decomp.component(1).unwrap(), &array![2.0]);
    assert!(matches!(
        decomp.component(2),
        Err(AffineError::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert!(matches!(
        decomp.coefficient(5),
        Err(AffineError::IndexOutOfRange { index: 5, len: 2 })
    ));
}
