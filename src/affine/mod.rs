//! # Affine decompositions
//!
//! An [`AffineDecomposition<T>`] represents the parameter-dependent container
//!
//! ```text
//! A(μ) = affine_part + Σ_q θ_q(μ) · component_q
//! ```
//!
//! It is built once by registering an optional affine part and any number of
//! `(component, coefficient)` pairs, and then frozen at as many parameters as
//! needed. Freezing never mutates the decomposition, so a fully built
//! decomposition can be shared between threads and frozen concurrently.
//!
//! ## Example Usage
//!
//! ```rust
//! use affine_decomp::affine::AffineDecomposition;
//! use affine_decomp::parameters::{CoefficientFunctional, Parameter, Parametrized};
//! use ndarray::array;
//!
//! let mut decomp = AffineDecomposition::with_affine_part(array![1.0, 1.0]);
//! decomp
//!     .register_component(
//!         array![1.0, 0.0],
//!         CoefficientFunctional::with_key("diffusion", 1, "2 * diffusion").unwrap(),
//!     )
//!     .unwrap();
//! assert!(decomp.parametric());
//!
//! let mu = Parameter::single("diffusion", 3.0).unwrap();
//! assert_eq!(decomp.freeze_parameter(&mu).unwrap(), array![7.0, 1.0]);
//! ```

pub mod config;

pub use config::{AssemblyConfig, AssemblyStrategy};

use crate::error::{AffineError, Result};
use crate::la::{assemble_sequential, check_shape, Assemble, LinearContainer, Prune};
use crate::parameters::{CoefficientFunctional, Parameter, ParameterType, Parametric, Parametrized};
use std::sync::Arc;
use tracing::{debug, trace};

/// Id under which the parameter type of coefficient `index` is inherited.
fn coefficient_id(index: usize) -> String {
    format!("coefficient_{}", index)
}

/// A container of type `T` depending affinely on a parameter
///
/// Stored containers are reference counted and never mutated in place, so the
/// same component may be registered with several decompositions. Use
/// [`AffineDecomposition::copy`] to obtain a decomposition that owns fresh
/// copies of all containers.
#[derive(Debug, Clone)]
pub struct AffineDecomposition<T> {
    parametric: Parametric,
    affine_part: Option<Arc<T>>,
    components: Vec<Arc<T>>,
    coefficients: Vec<CoefficientFunctional>,
    config: AssemblyConfig,
}

impl<T: LinearContainer> Default for AffineDecomposition<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LinearContainer> AffineDecomposition<T> {
    /// Create an empty decomposition; it cannot be frozen until something is registered.
    pub fn new() -> Self {
        Self::with_config(AssemblyConfig::default())
    }

    /// Create an empty decomposition with the given configuration.
    pub fn with_config(config: AssemblyConfig) -> Self {
        Self {
            parametric: Parametric::new(),
            affine_part: None,
            components: Vec::new(),
            coefficients: Vec::new(),
            config,
        }
    }

    /// Create a non-parametric decomposition from its affine part.
    pub fn with_affine_part(affine_part: impl Into<Arc<T>>) -> Self {
        let mut decomp = Self::new();
        decomp.affine_part = Some(affine_part.into());
        decomp
    }

    /// Create a decomposition from a single component.
    pub fn with_component(
        component: impl Into<Arc<T>>,
        coefficient: CoefficientFunctional,
    ) -> Result<Self> {
        let mut decomp = Self::new();
        decomp.register_component(component, coefficient)?;
        Ok(decomp)
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AssemblyConfig) {
        self.config = config;
    }

    /// The registry mapping `coefficient_<q>` to the type of coefficient `q`.
    pub fn parametric_registry(&self) -> &Parametric {
        &self.parametric
    }

    /// Register the parameter-independent part.
    ///
    /// # Errors
    ///
    /// * `AlreadyHasAffinePart` if one was registered before
    /// * `ShapeMismatch` if it disagrees in shape with the registered components
    pub fn register_affine_part(&mut self, affine_part: impl Into<Arc<T>>) -> Result<()> {
        if self.affine_part.is_some() {
            return Err(AffineError::AlreadyHasAffinePart);
        }
        let affine_part = affine_part.into();
        if let Some(component) = self.components.first() {
            check_shape(&**component, &*affine_part)?;
        }
        debug!(shape = %affine_part.shape(), "registered affine part");
        self.affine_part = Some(affine_part);
        Ok(())
    }

    /// Append a component with its coefficient.
    ///
    /// The coefficient's parameter type is inherited under `coefficient_<q>`,
    /// `q` being the index of the new component. Nothing is registered if an
    /// error is returned.
    ///
    /// # Errors
    ///
    /// * `ShapeMismatch` if the component disagrees in shape with the affine
    ///   part or the registered components
    /// * `SizesDoNotMatch` if the coefficient uses a key that is already known
    ///   with another size
    pub fn register_component(
        &mut self,
        component: impl Into<Arc<T>>,
        coefficient: CoefficientFunctional,
    ) -> Result<()> {
        let component = component.into();
        if let Some(reference) = self.affine_part.as_ref().or_else(|| self.components.first()) {
            check_shape(&**reference, &*component)?;
        }

        let index = self.components.len();
        self.parametric
            .inherit_parameter_type(coefficient.parameter_type(), &coefficient_id(index))?;
        debug!(
            index,
            shape = %component.shape(),
            coefficient = %coefficient,
            "registered component"
        );
        self.components.push(component);
        self.coefficients.push(coefficient);
        Ok(())
    }

    pub fn has_affine_part(&self) -> bool {
        self.affine_part.is_some()
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// `true` if neither an affine part nor a component has been registered.
    pub fn is_empty(&self) -> bool {
        self.affine_part.is_none() && self.components.is_empty()
    }

    /// # Errors
    ///
    /// * `RequirementsNotMet` if no affine part was registered
    pub fn affine_part(&self) -> Result<&T> {
        self.shared_affine_part().map(|part| &**part)
    }

    /// The affine part as a shared handle, for registration with another decomposition.
    pub fn shared_affine_part(&self) -> Result<&Arc<T>> {
        self.affine_part
            .as_ref()
            .ok_or(AffineError::RequirementsNotMet {
                reason: "the decomposition has no affine part",
            })
    }

    /// # Errors
    ///
    /// * `RequirementsNotMet` if no component was registered
    /// * `IndexOutOfRange` if `index >= num_components()`
    pub fn component(&self, index: usize) -> Result<&T> {
        self.shared_component(index).map(|component| &**component)
    }

    /// Component `index` as a shared handle, for registration with another decomposition.
    pub fn shared_component(&self, index: usize) -> Result<&Arc<T>> {
        self.check_index(index)?;
        Ok(&self.components[index])
    }

    /// # Errors
    ///
    /// * `RequirementsNotMet` if no component was registered
    /// * `IndexOutOfRange` if `index >= num_components()`
    pub fn coefficient(&self, index: usize) -> Result<&CoefficientFunctional> {
        self.check_index(index)?;
        Ok(&self.coefficients[index])
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if self.components.is_empty() {
            return Err(AffineError::RequirementsNotMet {
                reason: "the decomposition has no components",
            });
        }
        if index >= self.components.len() {
            return Err(AffineError::IndexOutOfRange {
                index,
                len: self.components.len(),
            });
        }
        Ok(())
    }

    /// Deep copy owning fresh copies of every stored container.
    pub fn copy(&self) -> Self {
        Self {
            parametric: self.parametric.clone(),
            affine_part: self.affine_part.as_ref().map(|part| Arc::new(part.copy())),
            components: self
                .components
                .iter()
                .map(|component| Arc::new(component.copy()))
                .collect(),
            coefficients: self.coefficients.clone(),
            config: self.config.clone(),
        }
    }

    /// Evaluate coefficient `index` at its slice of the global parameter `mu`.
    fn evaluate_coefficient(&self, index: usize, mu: &Parameter, config: &AssemblyConfig) -> Result<f64> {
        let local = self.parametric.map_parameter(mu, &coefficient_id(index))?;
        self.coefficients[index].evaluate_bounded(&local, config.coefficient_bound)
    }
}

impl<T: Assemble> AffineDecomposition<T> {
    /// Evaluate the decomposition at `mu`.
    ///
    /// A lone operand is copied (and scaled by its coefficient if it is a
    /// component). Several operands are reduced by [`Assemble::assemble`], or
    /// by the generic copy-scal-axpy reduction if the configured strategy is
    /// [`AssemblyStrategy::Sequential`].
    ///
    /// # Errors
    ///
    /// * `WrongParameterType` unless `mu`'s type equals [`Parametrized::parameter_type`]
    /// * `RequirementsNotMet` if nothing was registered
    /// * `InternalError` if a coefficient evaluates to an implausible value
    pub fn freeze_parameter(&self, mu: &Parameter) -> Result<T> {
        self.freeze_parameter_with(mu, &self.config)
    }

    /// Evaluate the decomposition at `mu` with an explicit configuration.
    pub fn freeze_parameter_with(&self, mu: &Parameter, config: &AssemblyConfig) -> Result<T> {
        if mu.parameter_type() != self.parametric.parameter_type() {
            return Err(AffineError::WrongParameterType {
                expected: self.parametric.parameter_type().clone(),
                actual: mu.parameter_type().clone(),
            });
        }
        if self.is_empty() {
            return Err(AffineError::RequirementsNotMet {
                reason: "cannot freeze a decomposition without affine part and components",
            });
        }

        match (&self.affine_part, self.components.as_slice()) {
            (Some(affine_part), []) => {
                trace!(operands = 1, "froze affine part");
                return Ok(affine_part.copy());
            }
            (None, [component]) => {
                let mut result = component.copy();
                result.scal(self.evaluate_coefficient(0, mu, config)?);
                trace!(operands = 1, "froze single component");
                return Ok(result);
            }
            _ => {}
        }

        let mut operands: Vec<(&T, f64)> = Vec::with_capacity(self.components.len() + 1);
        if let Some(affine_part) = &self.affine_part {
            operands.push((&**affine_part, 1.0));
        }
        for (index, component) in self.components.iter().enumerate() {
            operands.push((&**component, self.evaluate_coefficient(index, mu, config)?));
        }

        trace!(
            operands = operands.len(),
            strategy = ?config.strategy,
            "freezing decomposition"
        );
        match config.strategy {
            AssemblyStrategy::Auto => T::assemble(&operands, config),
            AssemblyStrategy::Sequential => assemble_sequential(&operands),
        }
    }
}

impl<T: Prune> AffineDecomposition<T> {
    /// Copy with every stored container pruned at the configured tolerance.
    pub fn pruned(&self) -> Self {
        self.pruned_with(self.config.prune_tolerance)
    }

    /// Copy with every stored container pruned at `tolerance`.
    pub fn pruned_with(&self, tolerance: f64) -> Self {
        Self {
            parametric: self.parametric.clone(),
            affine_part: self
                .affine_part
                .as_ref()
                .map(|part| Arc::new(part.pruned(tolerance))),
            components: self
                .components
                .iter()
                .map(|component| Arc::new(component.pruned(tolerance)))
                .collect(),
            coefficients: self.coefficients.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T> Parametrized for AffineDecomposition<T> {
    fn parameter_type(&self) -> &ParameterType {
        self.parametric.parameter_type()
    }
}
