use affine_decomp::{AffineError, Parameter, ParameterType, Parametric, Parametrized};

#[test]
fn test_map_parameter_type_returns_inherited_type() {
    let t = ParameterType::from_pairs([("a", 2), ("b", 1)]).unwrap();
    let mut owner = Parametric::new();
    owner.inherit_parameter_type(&t, "x").unwrap();
    assert_eq!(owner.map_parameter_type("x").unwrap(), &t);
}

#[test]
fn test_map_parameter_extracts_slice() {
    let mut owner = Parametric::new();
    owner
        .inherit_parameter_type(&ParameterType::single("a", 2).unwrap(), "x")
        .unwrap();
    owner
        .inherit_parameter_type(&ParameterType::single("b", 1).unwrap(), "y")
        .unwrap();

    let mu = Parameter::from_pairs([("a", vec![1.0, 2.0]), ("b", vec![3.0])]).unwrap();
    let sub = owner.map_parameter(&mu, "x").unwrap();
    assert_eq!(sub, Parameter::from_pairs([("a", vec![1.0, 2.0])]).unwrap());
    assert_eq!(sub.parameter_type(), owner.map_parameter_type("x").unwrap());
}

#[test]
fn test_shared_keys_are_merged_once() {
    let mut owner = Parametric::new();
    owner
        .inherit_parameter_type(&ParameterType::from_pairs([("a", 1), ("b", 2)]).unwrap(), "x")
        .unwrap();
    owner
        .inherit_parameter_type(&ParameterType::from_pairs([("b", 2), ("c", 1)]).unwrap(), "y")
        .unwrap();
    assert_eq!(owner.parameter_type().keys(), vec!["a", "b", "c"]);
    assert_eq!(Parametrized::parameter_type(&owner).dim(), 4);

    let mu = Parameter::from_pairs([("a", vec![1.0]), ("b", vec![2.0, 3.0]), ("c", vec![4.0])]).unwrap();
    assert_eq!(owner.map_parameter(&mu, "y").unwrap().serialize(), vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_conflicting_sizes() {
    let mut owner = Parametric::new();
    owner
        .inherit_parameter_type(&ParameterType::single("diffusion", 1).unwrap(), "lhs")
        .unwrap();
    match owner.inherit_parameter_type(&ParameterType::single("diffusion", 2).unwrap(), "rhs") {
        Err(AffineError::SizesDoNotMatch {
            key,
            existing,
            requested,
        }) => {
            assert_eq!(key, "diffusion");
            assert_eq!((existing, requested), (1, 2));
        }
        other => panic!("Expected SizesDoNotMatch, got {:?}", other),
    }
}

#[test]
fn test_nested_owners() {
    // A composite owner inherits the global type of another owner
    let mut inner = Parametric::new();
    inner
        .inherit_parameter_type(&ParameterType::single("a", 1).unwrap(), "left")
        .unwrap();
    inner
        .inherit_parameter_type(&ParameterType::single("b", 1).unwrap(), "right")
        .unwrap();

    let mut outer = Parametric::new();
    outer.inherit_parameter_type(inner.parameter_type(), "inner").unwrap();
    outer
        .inherit_parameter_type(&ParameterType::single("c", 1).unwrap(), "other")
        .unwrap();

    let mu = Parameter::from_pairs([("a", vec![1.0]), ("b", vec![2.0]), ("c", vec![3.0])]).unwrap();
    let inner_mu = outer.map_parameter(&mu, "inner").unwrap();
    assert_eq!(inner_mu.parameter_type(), inner.parameter_type());
    assert_eq!(
        inner.map_parameter(&inner_mu, "right").unwrap(),
        Parameter::single("b", 2.0).unwrap()
    );
}
