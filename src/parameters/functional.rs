//! Scalar coefficient functionals `θ(μ)`
//!
//! A [`CoefficientFunctional`] binds one variable per flattened component of
//! its [`ParameterType`]: key `mu` of size 3 provides `mu[0]`, `mu[1]` and
//! `mu[2]`, in key-insertion order. A key of size 1 is additionally available
//! under its bare name. The expression is compiled once at construction.

use crate::error::{AffineError, Result};
use crate::parameters::expression::{CompiledExpression, Expression, ExpressionError};
use crate::parameters::parameter::Parameter;
use crate::parameters::parameter_type::ParameterType;
use crate::parameters::Parametrized;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

/// Magnitude above which an evaluated coefficient is treated as a binding error.
pub const DEFAULT_COEFFICIENT_BOUND: f64 = 0.9 * f64::MAX;

/// A compiled scalar expression over the components of a parameter
///
/// # Examples
///
/// ```
/// use affine_decomp::parameters::{CoefficientFunctional, Parameter, ParameterType};
///
/// let ty = ParameterType::single("mu", 3).unwrap();
/// let theta = CoefficientFunctional::new(ty, "mu[0] + sin(mu[1]) + cos(mu[2])").unwrap();
///
/// let mu = Parameter::from_pairs([("mu", vec![1.0, 0.0, 0.0])]).unwrap();
/// assert_eq!(theta.evaluate(&mu).unwrap(), 2.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "FunctionalRepr", into = "FunctionalRepr")]
pub struct CoefficientFunctional {
    ty: ParameterType,
    expression: String,
    /// `key[i]` names in slot order
    variables: Vec<String>,
    compiled: CompiledExpression,
}

/// Alias used by discretization code that thinks of `θ` as a parameter functional.
pub type ParameterFunctional = CoefficientFunctional;

impl CoefficientFunctional {
    /// Parse and compile `expression` against the variables of `ty`.
    ///
    /// # Errors
    ///
    /// * `Expression` if the text does not parse, references a variable `ty`
    ///   does not provide, or calls an unknown function. The bare name of a
    ///   key wider than 1 is undefined, also for keys named `e` or `pi`.
    pub fn new(ty: ParameterType, expression: &str) -> Result<Self> {
        let mut variables = Vec::with_capacity(ty.dim());
        for (key, size) in ty.iter() {
            for i in 0..size {
                variables.push(format!("{}[{}]", key, i));
            }
        }

        let parsed = Expression::parse(expression)?;
        // A key of the type is never a constant, even if it is named `e` or `pi`
        for name in parsed.variables() {
            if ty.has_key(&name) && slot_of(&ty, &variables, &name).is_none() {
                return Err(ExpressionError::UndefinedVariable { name }.into());
            }
        }
        let compiled = parsed.compile(|name| slot_of(&ty, &variables, name))?;

        Ok(Self {
            ty,
            expression: expression.to_string(),
            variables,
            compiled,
        })
    }

    /// Shorthand for a functional over a single key.
    pub fn with_key(key: &str, size: usize, expression: &str) -> Result<Self> {
        Self::new(ParameterType::single(key, size)?, expression)
    }

    /// The expression text as given at construction.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Variable names in slot order, `key[i]` for every flattened component.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Evaluate `θ(μ)`.
    ///
    /// # Errors
    ///
    /// * `WrongParameterType` unless `mu`'s type equals this functional's type
    /// * `InternalError` if the value is not finite or its magnitude exceeds
    ///   [`DEFAULT_COEFFICIENT_BOUND`]
    pub fn evaluate(&self, mu: &Parameter) -> Result<f64> {
        self.evaluate_bounded(mu, DEFAULT_COEFFICIENT_BOUND)
    }

    /// Evaluate `θ(μ)`, flagging values with a magnitude above `bound`.
    pub fn evaluate_bounded(&self, mu: &Parameter, bound: f64) -> Result<f64> {
        if mu.parameter_type() != &self.ty {
            return Err(AffineError::WrongParameterType {
                expected: self.ty.clone(),
                actual: mu.parameter_type().clone(),
            });
        }

        let slots = mu.serialize();
        let value = self.compiled.evaluate(&slots)?;
        if !value.is_finite() || value.abs() > bound {
            error!(
                expression = %self.expression,
                value,
                "coefficient evaluation produced an implausible value"
            );
            return Err(AffineError::InternalError {
                expression: self.expression.clone(),
                value,
            });
        }
        Ok(value)
    }
}

/// Slot of `name` among `variables`; a size-1 key also answers to its bare name.
fn slot_of(ty: &ParameterType, variables: &[String], name: &str) -> Option<usize> {
    if let Some(slot) = variables.iter().position(|v| v == name) {
        return Some(slot);
    }
    match ty.get(name) {
        Ok(1) => variables.iter().position(|v| v == &format!("{}[0]", name)),
        _ => None,
    }
}

impl Parametrized for CoefficientFunctional {
    fn parameter_type(&self) -> &ParameterType {
        &self.ty
    }
}

// Same type and same text; the compiled form is derived from those.
impl PartialEq for CoefficientFunctional {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.expression == other.expression
    }
}

impl fmt::Display for CoefficientFunctional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "theta({}) = \"{}\"", self.ty, self.expression)
    }
}

#[derive(Serialize, Deserialize)]
struct FunctionalRepr {
    parameter_type: ParameterType,
    expression: String,
}

impl TryFrom<FunctionalRepr> for CoefficientFunctional {
    type Error = AffineError;

    fn try_from(repr: FunctionalRepr) -> Result<Self> {
        Self::new(repr.parameter_type, &repr.expression)
    }
}

impl From<CoefficientFunctional> for FunctionalRepr {
    fn from(functional: CoefficientFunctional) -> Self {
        Self {
            parameter_type: functional.ty,
            expression: functional.expression,
        }
    }
}
