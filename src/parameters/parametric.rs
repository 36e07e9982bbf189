//! Namespaced parameter inheritance
//!
//! A [`Parametric`] owns the global parameter type of a composite object and
//! remembers, per id, which slice of that type was contributed by which child.
//! Given a global [`Parameter`], [`Parametric::map_parameter`] recovers exactly
//! the sub-parameter the child with that id was built against.

use crate::error::{AffineError, Result};
use crate::parameters::parameter::Parameter;
use crate::parameters::parameter_type::ParameterType;
use crate::parameters::Parametrized;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Global parameter type plus the registry of inherited sub-types
///
/// # Examples
///
/// ```
/// use affine_decomp::parameters::{Parameter, ParameterType, Parametric};
///
/// let mut owner = Parametric::new();
/// owner
///     .inherit_parameter_type(&ParameterType::single("diffusion", 2).unwrap(), "lhs")
///     .unwrap();
/// owner
///     .inherit_parameter_type(&ParameterType::single("force", 1).unwrap(), "rhs")
///     .unwrap();
/// assert_eq!(owner.parameter_type().keys(), vec!["diffusion", "force"]);
///
/// let mu = Parameter::from_pairs([("diffusion", vec![1.0, 2.0]), ("force", vec![3.0])]).unwrap();
/// let sub = owner.map_parameter(&mu, "rhs").unwrap();
/// assert_eq!(sub, Parameter::single("force", 3.0).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parametric {
    /// Union of all inherited types, in first-seen key order
    ty: ParameterType,

    /// id -> the exact type inherited under that id
    inherits: BTreeMap<String, ParameterType>,
}

impl Parametric {
    /// Create a non-parametric owner.
    pub fn new() -> Self {
        Self {
            ty: ParameterType::new(),
            inherits: BTreeMap::new(),
        }
    }

    /// Create an owner with a global type of its own and an empty registry.
    pub fn with_type(ty: ParameterType) -> Self {
        Self {
            ty,
            inherits: BTreeMap::new(),
        }
    }

    /// The global parameter type.
    pub fn parameter_type(&self) -> &ParameterType {
        &self.ty
    }

    /// `true` if the global type has at least one key.
    pub fn parametric(&self) -> bool {
        !self.ty.is_empty()
    }

    /// Merge `child` into the global type and record it under `id`.
    ///
    /// Keys already present must have the same size. Either every key of
    /// `child` is merged or, on error, nothing changes. Inheriting an `id` a
    /// second time replaces the previous mapping; keys merged by the previous
    /// mapping stay in the global type.
    ///
    /// # Errors
    ///
    /// * `KeyIsNotValid` for an empty `id`
    /// * `SizesDoNotMatch` if a key of `child` is known with another size
    pub fn inherit_parameter_type(&mut self, child: &ParameterType, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(AffineError::KeyIsNotValid {
                key: String::new(),
                known: self.inherited_ids().into_iter().map(String::from).collect(),
            });
        }

        let mut merged = self.ty.clone();
        for (key, size) in child.iter() {
            merged.set(key, size)?;
        }
        self.ty = merged;

        if self.inherits.insert(id.to_string(), child.clone()).is_some() {
            warn!(id, "parameter type inherited twice, replacing previous mapping");
        } else {
            debug!(id, keys = child.size(), "inherited parameter type");
        }
        Ok(())
    }

    /// Inherit the type induced by `mu` under `id`.
    pub fn inherit_parameter_type_of(&mut self, mu: &Parameter, id: &str) -> Result<()> {
        self.inherit_parameter_type(mu.parameter_type(), id)
    }

    /// The exact type previously inherited under `id`.
    pub fn map_parameter_type(&self, id: &str) -> Result<&ParameterType> {
        self.inherits
            .get(id)
            .ok_or_else(|| AffineError::KeyIsNotValid {
                key: id.to_string(),
                known: self.inherits.keys().cloned().collect(),
            })
    }

    /// Extract from the global parameter `mu` the sub-parameter inherited under `id`.
    ///
    /// `mu` must contain every key recorded for `id` with the recorded size and
    /// may carry any number of additional keys. The result has exactly the
    /// recorded keys, in the recorded order.
    ///
    /// # Errors
    ///
    /// * `KeyIsNotValid` if `id` was never inherited
    /// * `WrongParameterType` if `mu` lacks a recorded key or has it with another size
    pub fn map_parameter(&self, mu: &Parameter, id: &str) -> Result<Parameter> {
        let ty = self.map_parameter_type(id)?;
        mu.restrict_to(ty)
    }

    /// Ids registered so far, sorted.
    pub fn inherited_ids(&self) -> Vec<&str> {
        self.inherits.keys().map(String::as_str).collect()
    }

    /// Reset the global type to `ty` and forget every inherited id.
    pub fn replace_parameter_type(&mut self, ty: ParameterType) {
        self.ty = ty;
        self.inherits.clear();
    }
}

impl Parametrized for Parametric {
    fn parameter_type(&self) -> &ParameterType {
        &self.ty
    }
}
