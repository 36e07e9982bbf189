//! # Parameter System
//!
//! Typed parameter spaces, concrete parameter values, the namespacing that lets
//! independently built objects share one global parameter, and the scalar
//! coefficient functionals evaluated against those parameters.
//!
//! ## Core Components
//!
//! - [`ParameterType`]: ordered `key -> size` description of a parameter space
//! - [`Parameter`]: ordered `key -> values` assignment of a concrete point
//! - [`Parametric`]: global type plus the registry of inherited sub-types
//! - [`CoefficientFunctional`]: a compiled expression `θ(μ)` over a parameter
//! - [`Expression`]: the expression language behind coefficient functionals
//!
//! ## Example Usage
//!
//! ```rust
//! use affine_decomp::parameters::{CoefficientFunctional, Parameter, Parametric, Parametrized};
//!
//! let theta_0 = CoefficientFunctional::with_key("diffusion", 2, "diffusion[0] * diffusion[1]").unwrap();
//! let theta_1 = CoefficientFunctional::with_key("force", 1, "2 * force").unwrap();
//!
//! // Merge both types into one global parameter space
//! let mut owner = Parametric::new();
//! owner.inherit_parameter_type(theta_0.parameter_type(), "lhs").unwrap();
//! owner.inherit_parameter_type(theta_1.parameter_type(), "rhs").unwrap();
//!
//! // Each functional sees only its own slice of the global parameter
//! let mu = Parameter::from_pairs([("diffusion", vec![2.0, 3.0]), ("force", vec![0.5])]).unwrap();
//! let lhs = theta_0.evaluate(&owner.map_parameter(&mu, "lhs").unwrap()).unwrap();
//! let rhs = theta_1.evaluate(&owner.map_parameter(&mu, "rhs").unwrap()).unwrap();
//! assert_eq!((lhs, rhs), (6.0, 1.0));
//! ```

pub mod expression;
pub mod functional;
pub mod parameter;
pub mod parameter_type;
pub mod parametric;

// Re-export key types
pub use expression::{CompiledExpression, Expression, ExpressionError};
pub use functional::{CoefficientFunctional, ParameterFunctional, DEFAULT_COEFFICIENT_BOUND};
pub use parameter::Parameter;
pub use parameter_type::ParameterType;
pub use parametric::Parametric;

/// Capability of objects that depend on a parameter
///
/// Implemented by [`Parametric`], [`CoefficientFunctional`] and
/// [`AffineDecomposition`](crate::affine::AffineDecomposition).
pub trait Parametrized {
    /// The type every parameter passed to this object must have.
    fn parameter_type(&self) -> &ParameterType;

    /// `true` if the object depends on at least one parameter key.
    fn parametric(&self) -> bool {
        !self.parameter_type().is_empty()
    }
}
