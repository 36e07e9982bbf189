use crate::test_helpers::{random_sparse, rng};
use affine_decomp::{AffineDecomposition, AssemblyConfig, CoefficientFunctional, CsrMatrix, Parameter};
use std::thread;

#[test]
fn test_concurrent_freezes_agree() {
    let mut rng = rng(11);
    let mut decomp = AffineDecomposition::with_config(AssemblyConfig {
        parallel_rows: Some(16),
        ..AssemblyConfig::default()
    });
    decomp
        .register_affine_part(random_sparse(&mut rng, 64, 64, 0.05))
        .unwrap();
    for q in 0..3 {
        let key = format!("mu{}", q);
        decomp
            .register_component(
                random_sparse(&mut rng, 64, 64, 0.05),
                CoefficientFunctional::with_key(&key, 1, &format!("exp({})", key)).unwrap(),
            )
            .unwrap();
    }

    let parameters: Vec<Parameter> = (0..8)
        .map(|i| {
            let v = i as f64 * 0.1;
            Parameter::from_pairs([("mu0", vec![v]), ("mu1", vec![-v]), ("mu2", vec![2.0 * v])]).unwrap()
        })
        .collect();
    let expected: Vec<CsrMatrix> = parameters
        .iter()
        .map(|mu| decomp.freeze_parameter(mu).unwrap())
        .collect();

    thread::scope(|scope| {
        let handles: Vec<_> = parameters
            .iter()
            .map(|mu| {
                let decomp = &decomp;
                scope.spawn(move || decomp.freeze_parameter(mu).unwrap())
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
    });
    assert_eq!(decomp.num_components(), 3);
}
