//! # Linear containers
//!
//! The contract an [`AffineDecomposition`](crate::affine::AffineDecomposition)
//! needs from the vectors and matrices it stores, and its implementations:
//!
//! - [`dense`]: `ndarray::Array1<f64>` and `ndarray::Array2<f64>`
//! - [`sparse`]: the row-major [`CsrMatrix`] with pattern-union assembly
//! - [`backends`] (feature `matrix`): `faer::Mat<f64>`, `nalgebra::DVector<f64>`
//!   and `nalgebra::DMatrix<f64>`
//!
//! Several backends have inherent methods named `shape` or `dot`. Call the
//! trait versions with fully qualified syntax when both are in scope, e.g.
//! `LinearContainer::dot(&a, &b)`.

pub mod dense;
pub mod sparse;

#[cfg(feature = "matrix")]
pub mod backends;

pub use sparse::{CsrMatrix, SparsityPattern};

use crate::affine::AssemblyConfig;
use crate::error::{AffineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimensions of a linear container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// A vector of the given length
    Vector(usize),

    /// A matrix with the given number of rows and columns
    Matrix { rows: usize, cols: usize },
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Vector(n) => write!(f, "vector({})", n),
            Shape::Matrix { rows, cols } => write!(f, "matrix({}x{})", rows, cols),
        }
    }
}

/// Operations every container stored in an affine decomposition supports
pub trait LinearContainer: Sized {
    /// Deep, exclusively owned copy.
    fn copy(&self) -> Self;

    fn shape(&self) -> Shape;

    fn has_equal_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    /// `self *= alpha`
    fn scal(&mut self, alpha: f64);

    /// `self += alpha * x`
    ///
    /// # Errors
    ///
    /// * `ShapeMismatch` if `x` has another shape
    fn axpy(&mut self, alpha: f64, x: &Self) -> Result<()>;

    /// Euclidean inner product, the Frobenius product for matrices.
    ///
    /// # Errors
    ///
    /// * `ShapeMismatch` if `other` has another shape
    fn dot(&self, other: &Self) -> Result<f64>;

    fn l2_norm(&self) -> f64 {
        self.dot(self).map_or(0.0, f64::sqrt)
    }
}

/// Reduction of weighted operands `Σ w_i · x_i` to one container
///
/// The provided implementation is [`assemble_sequential`]. Containers with a
/// cheaper way to combine many operands at once override it.
pub trait Assemble: LinearContainer {
    /// # Errors
    ///
    /// * `RequirementsNotMet` for an empty operand list
    /// * `ShapeMismatch` if the operands disagree in shape
    fn assemble(operands: &[(&Self, f64)], _config: &AssemblyConfig) -> Result<Self> {
        assemble_sequential(operands)
    }
}

/// Removal of negligible entries
pub trait Prune: LinearContainer {
    /// Copy of `self` without the entries whose magnitude is at most `tolerance`.
    ///
    /// Dense containers set such entries to zero, sparse ones drop them from
    /// their pattern.
    fn pruned(&self, tolerance: f64) -> Self;
}

/// Copy the first operand, scale it by its weight and `axpy` every further operand.
pub fn assemble_sequential<T: LinearContainer>(operands: &[(&T, f64)]) -> Result<T> {
    let ((first, weight), rest) = operands
        .split_first()
        .ok_or(AffineError::RequirementsNotMet {
            reason: "cannot assemble an empty list of operands",
        })?;

    let mut result = first.copy();
    result.scal(*weight);
    for (operand, weight) in rest {
        result.axpy(*weight, operand)?;
    }
    Ok(result)
}

/// `Ok(())` if both containers have the same shape, `ShapeMismatch` otherwise.
pub(crate) fn check_shape<T: LinearContainer>(expected: &T, actual: &T) -> Result<()> {
    if expected.has_equal_shape(actual) {
        Ok(())
    } else {
        Err(AffineError::ShapeMismatch {
            expected: expected.shape(),
            actual: actual.shape(),
        })
    }
}
