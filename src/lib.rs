//! # affine-decomp
//!
//! `affine-decomp` represents parameter-dependent vectors and matrices as affine
//! decompositions
//!
//! ```text
//! A(μ) = affine_part + Σ_q θ_q(μ) · component_q
//! ```
//!
//! the building block of reduced-order models: the linear pieces are assembled
//! once, and evaluating `A` at a concrete parameter `μ` becomes a cheap linear
//! combination instead of a full re-assembly.
//!
//! The library provides:
//! - Typed, named parameter spaces with namespaced inheritance ([`parameters`])
//! - Coefficient functionals `θ_q` compiled from mathematical expressions
//! - The [`AffineDecomposition`] registration and freezing engine ([`affine`])
//! - Container backends for `ndarray`, a CSR sparse matrix with pattern-union
//!   assembly, and (feature `matrix`) `faer` and `nalgebra` ([`la`])
//!
//! ## Basic Usage
//!
//! ```
//! use affine_decomp::{AffineDecomposition, CoefficientFunctional, CsrMatrix, Parameter};
//!
//! let stiffness = CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (0, 1, -1.0), (1, 1, 2.0)]).unwrap();
//! let mass = CsrMatrix::identity(2);
//!
//! let mut operator = AffineDecomposition::new();
//! operator
//!     .register_component(stiffness, CoefficientFunctional::with_key("k", 1, "k").unwrap())
//!     .unwrap();
//! operator
//!     .register_component(mass, CoefficientFunctional::with_key("m", 1, "m^2").unwrap())
//!     .unwrap();
//!
//! let mu = Parameter::from_pairs([("k", vec![1.0]), ("m", vec![3.0])]).unwrap();
//! let frozen = operator.freeze_parameter(&mu).unwrap();
//! assert_eq!(frozen.get(0, 0), Some(11.0));
//! assert_eq!(frozen.get(0, 1), Some(-1.0));
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

// Linear containers
pub mod la;

// Affine decompositions
pub mod affine;

// Re-exports for convenience
pub use affine::{AffineDecomposition, AssemblyConfig, AssemblyStrategy};
pub use error::{AffineError, Result};
pub use la::{Assemble, CsrMatrix, LinearContainer, Prune, Shape, SparsityPattern};
pub use parameters::{
    CoefficientFunctional, Parameter, ParameterFunctional, ParameterType, Parametric, Parametrized,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
