use crate::test_helpers::{matrix_approx_eq, random_sparse, rng};
use affine_decomp::{
    AffineDecomposition, AffineError, AssemblyConfig, AssemblyStrategy, CoefficientFunctional,
    CsrMatrix, LinearContainer, Parameter, ParameterType, Parametrized,
};
use approx::assert_relative_eq;
use ndarray::{array, Array1};

fn theta(key: &str, size: usize, expression: &str) -> CoefficientFunctional {
    CoefficientFunctional::with_key(key, size, expression).unwrap()
}

#[test]
fn test_freeze_matches_reference_dense() {
    let a = array![1.0, 2.0, 3.0];
    let c0 = array![0.5, 0.0, -1.0];
    let c1 = array![2.0, 2.0, 2.0];
    let theta0 = theta("diffusion", 2, "diffusion[0] * diffusion[1]");
    let theta1 = theta("force", 1, "sin(force)");

    let mut decomp = AffineDecomposition::with_affine_part(a.clone());
    decomp.register_component(c0.clone(), theta0.clone()).unwrap();
    decomp.register_component(c1.clone(), theta1.clone()).unwrap();

    for (d0, d1, f) in [(1.0, 2.0, 0.3), (0.1, -4.0, 2.0), (0.0, 0.0, 0.0)] {
        let mu = Parameter::from_pairs([("diffusion", vec![d0, d1]), ("force", vec![f])]).unwrap();
        let frozen = decomp.freeze_parameter(&mu).unwrap();

        let w0 = d0 * d1;
        let w1 = f64::sin(f);
        let reference: Array1<f64> = &a + &(&c0 * w0) + &(&c1 * w1);
        for (x, y) in frozen.iter().zip(reference.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
        let diff = &frozen - &reference;
        assert!(LinearContainer::dot(&diff, &diff).unwrap() < 1e-20);
    }
}

#[test]
fn test_freeze_is_idempotent() {
    let mut decomp = AffineDecomposition::with_affine_part(CsrMatrix::identity(3));
    decomp
        .register_component(
            CsrMatrix::from_triplets(3, 3, &[(0, 2, 1.0), (2, 0, 1.0)]).unwrap(),
            theta("mu", 1, "2 * mu"),
        )
        .unwrap();
    let mu = Parameter::single("mu", 0.25).unwrap();

    let first = decomp.freeze_parameter(&mu).unwrap();
    let second = decomp.freeze_parameter(&mu).unwrap();
    assert_eq!(first, second);
    assert_eq!(decomp.num_components(), 1);
    assert_eq!(decomp.affine_part().unwrap(), &CsrMatrix::identity(3));
    assert_eq!(first.get(0, 2), Some(0.5));
}

#[test]
fn test_freeze_sparse_matches_dense_reference() {
    let mut rng = rng(7);
    let affine = random_sparse(&mut rng, 20, 15, 0.1);
    let components: Vec<CsrMatrix> = (0..4).map(|_| random_sparse(&mut rng, 20, 15, 0.15)).collect();

    let mut decomp = AffineDecomposition::with_affine_part(affine.clone());
    for (q, component) in components.iter().enumerate() {
        let key = format!("mu{}", q);
        let expression = format!("{} * {} + 1", key, q);
        decomp
            .register_component(component.clone(), theta(&key, 1, &expression))
            .unwrap();
    }
    assert_eq!(decomp.parameter_type().size(), 4);

    let values = [0.5, -1.0, 2.0, 0.0];
    let mu = Parameter::deserialize(decomp.parameter_type(), &values).unwrap();
    let frozen = decomp.freeze_parameter(&mu).unwrap();

    let mut reference = affine.to_dense();
    for (q, component) in components.iter().enumerate() {
        let weight = values[q] * q as f64 + 1.0;
        reference = reference + component.to_dense() * weight;
    }
    assert!(matrix_approx_eq(&frozen.to_dense(), &reference, 1e-12));

    // The generic reduction produces the same matrix
    let sequential = AssemblyConfig {
        strategy: AssemblyStrategy::Sequential,
        ..AssemblyConfig::default()
    };
    let generic = decomp.freeze_parameter_with(&mu, &sequential).unwrap();
    assert!(matrix_approx_eq(&generic.to_dense(), &reference, 1e-12));
    assert_eq!(generic.pattern(), frozen.pattern());
}

#[test]
fn test_coefficients_see_only_their_keys() {
    // Both coefficients use the key "mu"; the global type holds it once
    let mut decomp = AffineDecomposition::new();
    decomp.register_component(array![1.0, 0.0], theta("mu", 2, "mu[0]")).unwrap();
    decomp
        .register_component(
            array![0.0, 1.0],
            CoefficientFunctional::new(
                ParameterType::from_pairs([("nu", 1), ("mu", 2)]).unwrap(),
                "nu * mu[1]",
            )
            .unwrap(),
        )
        .unwrap();
    assert_eq!(decomp.parameter_type().keys(), vec!["mu", "nu"]);

    let mu = Parameter::from_pairs([("mu", vec![3.0, 4.0]), ("nu", vec![0.5])]).unwrap();
    assert_eq!(decomp.freeze_parameter(&mu).unwrap(), array![3.0, 2.0]);
}

#[test]
fn test_parameter_in_wrong_order_is_rejected() {
    let mut decomp = AffineDecomposition::new();
    decomp.register_component(array![1.0], theta("a", 1, "a")).unwrap();
    decomp.register_component(array![1.0], theta("b", 1, "b")).unwrap();

    let mu = Parameter::from_pairs([("b", vec![1.0]), ("a", vec![2.0])]).unwrap();
    assert!(matches!(
        decomp.freeze_parameter(&mu),
        Err(AffineError::WrongParameterType { .. })
    ));
    let reordered = mu.restrict_to(decomp.parameter_type()).unwrap();
    assert_eq!(decomp.freeze_parameter(&reordered).unwrap(), array![3.0]);
}

#[test]
fn test_coefficient_bound_from_config() {
    let mut decomp = AffineDecomposition::with_config(AssemblyConfig {
        coefficient_bound: 100.0,
        ..AssemblyConfig::default()
    });
    decomp.register_affine_part(array![0.0]).unwrap();
    decomp.register_component(array![1.0], theta("mu", 1, "mu")).unwrap();

    assert_eq!(
        decomp.freeze_parameter(&Parameter::single("mu", 50.0).unwrap()).unwrap(),
        array![50.0]
    );
    match decomp.freeze_parameter(&Parameter::single("mu", 500.0).unwrap()) {
        Err(AffineError::InternalError { expression, value }) => {
            assert_eq!(expression, "mu");
            assert_eq!(value, 500.0);
        }
        other => panic!("Expected InternalError, got {:?}", other),
    }

    decomp.set_config(AssemblyConfig::default());
    assert!(decomp.freeze_parameter(&Parameter::single("mu", 500.0).unwrap()).is_ok());
}
