use affine_decomp::parameters::expression::ExpressionError;
use affine_decomp::{AffineError, CoefficientFunctional, Parameter, ParameterFunctional, ParameterType};
use approx::assert_relative_eq;

#[test]
fn test_evaluation_scenario() {
    let theta = ParameterFunctional::new(
        ParameterType::single("mu", 3).unwrap(),
        "mu[0] + sin(mu[1]) + cos(mu[2])",
    )
    .unwrap();
    let mu = Parameter::from_pairs([("mu", vec![1.0, 0.0, 0.0])]).unwrap();
    assert_eq!(theta.evaluate(&mu).unwrap(), 2.0);
}

#[test]
fn test_multi_key_functional() {
    let ty = ParameterType::from_pairs([("diffusion", 2), ("force", 1)]).unwrap();
    let theta = CoefficientFunctional::new(
        ty.clone(),
        "diffusion[0] * exp(-diffusion[1]) + max(force, 0)",
    )
    .unwrap();
    let mu = Parameter::with_type(&ty, vec![vec![2.0, 1.0], vec![-1.0]]).unwrap();
    assert_relative_eq!(theta.evaluate(&mu).unwrap(), 2.0 * (-1.0_f64).exp());
    assert_eq!(theta.expression(), "diffusion[0] * exp(-diffusion[1]) + max(force, 0)");
    assert_eq!(theta.variables().len(), 3);
}

#[test]
fn test_evaluation_is_repeatable() {
    let theta = CoefficientFunctional::with_key("mu", 2, "mu[0] ^ 2 - mu[1] / 2").unwrap();
    let a = Parameter::from_pairs([("mu", vec![3.0, 4.0])]).unwrap();
    let b = Parameter::from_pairs([("mu", vec![1.0, 1.0])]).unwrap();
    assert_eq!(theta.evaluate(&a).unwrap(), 7.0);
    assert_eq!(theta.evaluate(&b).unwrap(), 0.5);
    assert_eq!(theta.evaluate(&a).unwrap(), 7.0);
}

#[test]
fn test_type_must_match_exactly() {
    let theta = CoefficientFunctional::with_key("mu", 1, "mu").unwrap();
    // A superset is not accepted; callers map the parameter first
    let mu = Parameter::from_pairs([("mu", vec![1.0]), ("nu", vec![2.0])]).unwrap();
    assert!(matches!(
        theta.evaluate(&mu),
        Err(AffineError::WrongParameterType { .. })
    ));
}

#[test]
fn test_construction_errors() {
    assert!(matches!(
        CoefficientFunctional::with_key("mu", 1, "mu +"),
        Err(AffineError::Expression(ExpressionError::ParseError { .. }))
    ));
    assert!(matches!(
        CoefficientFunctional::with_key("mu", 1, "gamma(mu)"),
        Err(AffineError::Expression(ExpressionError::UndefinedFunction { .. }))
    ));
    assert!(matches!(
        CoefficientFunctional::with_key("mu", 1, "nu"),
        Err(AffineError::Expression(ExpressionError::UndefinedVariable { .. }))
    ));
    assert!(matches!(
        CoefficientFunctional::with_key("", 1, "1"),
        Err(AffineError::KeyIsNotValid { .. })
    ));
}
