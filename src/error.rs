use crate::la::Shape;
use crate::parameters::expression::ExpressionError;
use crate::parameters::ParameterType;
use thiserror::Error;

/// Error types for the affine-decomp library.
///
/// Every variant describes a contract violation by the caller: a parameter of
/// the wrong type, containers of disagreeing shape, a misconfigured parameter
/// registry. None of them is retried or recovered internally.
#[derive(Error, Debug)]
pub enum AffineError {
    /// A parameter does not have the type the operation expects.
    #[error("wrong parameter type: expected {expected}, got {actual}")]
    WrongParameterType {
        expected: ParameterType,
        actual: ParameterType,
    },

    /// A container's shape disagrees with the containers already registered.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: Shape, actual: Shape },

    /// Two parameter types disagree on the width of a shared key.
    #[error("size of key '{key}' does not match: existing {existing}, requested {requested}")]
    SizesDoNotMatch {
        key: String,
        existing: usize,
        requested: usize,
    },

    /// An index outside `[0, len)`.
    #[error("index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The object is not in a state that allows the requested operation.
    #[error("requirements not met: {reason}")]
    RequirementsNotMet { reason: &'static str },

    /// `register_affine_part` was called twice.
    #[error("an affine part has already been registered")]
    AlreadyHasAffinePart,

    /// An empty key or an id that was never inherited.
    #[error("key '{key}' is not valid (known: {known:?})")]
    KeyIsNotValid { key: String, known: Vec<String> },

    /// Lookup of a key that is not present.
    #[error("key '{key}' not found")]
    KeyNotFound { key: String },

    /// A coefficient produced a value no sane expression yields.
    #[error("evaluating '{expression}' yielded the implausible value {value}")]
    InternalError { expression: String, value: f64 },

    /// A parameter component width of zero.
    #[error("invalid size {size} for key '{key}'")]
    InvalidSize { key: String, size: usize },

    /// A key given twice during construction.
    #[error("duplicate key '{key}'")]
    DuplicateKey { key: String },

    /// Sequences of unequal length, e.g. keys and sizes during construction.
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A sparse entry outside the matrix.
    #[error("entry ({row}, {col}) lies outside a {nrows}x{ncols} matrix")]
    EntryOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },

    /// Malformed compressed-row data.
    #[error("invalid sparse structure: {0}")]
    InvalidSparseStructure(&'static str),

    /// Parsing or compiling a coefficient expression failed.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for affine-decomp operations.
pub type Result<T> = std::result::Result<T, AffineError>;
