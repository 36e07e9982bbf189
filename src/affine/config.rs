//! Configuration options for freezing affine decompositions.
//!
//! The options select how the weighted operands of a decomposition are reduced
//! to one container, when sparse assembly goes row-parallel, and the thresholds
//! used by pruning and by the coefficient sanity check.

use crate::parameters::DEFAULT_COEFFICIENT_BOUND;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Reduction used by `freeze_parameter` when there is more than one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStrategy {
    /// Use the container's own assembly, the sparsity pattern union for sparse matrices
    Auto,

    /// Always use copy, scal and one axpy per further operand
    Sequential,
}

impl Default for AssemblyStrategy {
    fn default() -> Self {
        AssemblyStrategy::Auto
    }
}

/// Configuration options for an affine decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Reduction strategy. Default: Auto
    pub strategy: AssemblyStrategy,

    /// Minimum number of rows for row-parallel sparse assembly; `None` never
    /// goes parallel. Default: Some(4096)
    pub parallel_rows: Option<usize>,

    /// Entries with a magnitude at or below this value are removed by `pruned`. Default: 0.0
    pub prune_tolerance: f64,

    /// Coefficient values above this magnitude are rejected as internal errors.
    /// Default: 0.9 * f64::MAX
    pub coefficient_bound: f64,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            strategy: AssemblyStrategy::default(),
            parallel_rows: Some(4096),
            prune_tolerance: 0.0,
            coefficient_bound: DEFAULT_COEFFICIENT_BOUND,
        }
    }
}

impl AssemblyConfig {
    /// `true` if an assembly producing `nrows` rows should run row-parallel.
    pub fn parallel_for(&self, nrows: usize) -> bool {
        self.parallel_rows.map_or(false, |threshold| nrows >= threshold)
    }

    /// Load a configuration from a JSON file; missing fields take their defaults.
    pub fn load_json<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}
