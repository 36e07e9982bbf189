//! Named, sized descriptions of a parameter space
//!
//! A [`ParameterType`] maps keys to component widths. Insertion order is part of
//! the type: it fixes the flattening order of every [`Parameter`](super::Parameter)
//! of that type and therefore the variable layout of coefficient expressions.

use crate::error::{AffineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The shape of a parameter space: an ordered list of `(key, size)` entries
///
/// Keys are unique and non-empty, sizes are strictly positive. Two types are
/// equal iff their entries agree in the same order; the derived ordering is
/// lexicographic over the entries, which makes types usable as `BTreeMap` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, usize)>", into = "Vec<(String, usize)>")]
pub struct ParameterType {
    entries: Vec<(String, usize)>,
}

impl ParameterType {
    /// Create an empty (non-parametric) type.
    ///
    /// # Examples
    ///
    /// ```
    /// use affine_decomp::parameters::ParameterType;
    ///
    /// let ty = ParameterType::new();
    /// assert!(ty.is_empty());
    /// assert_eq!(ty.size(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a type with a single key.
    pub fn single(key: &str, size: usize) -> Result<Self> {
        let mut ty = Self::new();
        ty.insert_new(key, size)?;
        Ok(ty)
    }

    /// Create a type from `(key, size)` pairs, in the given order.
    ///
    /// # Errors
    ///
    /// * `KeyIsNotValid` for an empty key
    /// * `InvalidSize` for a size of zero
    /// * `DuplicateKey` if a key appears twice
    ///
    /// # Examples
    ///
    /// ```
    /// use affine_decomp::parameters::ParameterType;
    ///
    /// let ty = ParameterType::from_pairs([("diffusion", 2), ("force", 1)]).unwrap();
    /// assert_eq!(ty.keys(), vec!["diffusion", "force"]);
    /// assert_eq!(ty.values(), vec![2, 1]);
    /// assert_eq!(ty.dim(), 3);
    /// ```
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, usize)>,
        K: AsRef<str>,
    {
        let mut ty = Self::new();
        for (key, size) in pairs {
            ty.insert_new(key.as_ref(), size)?;
        }
        Ok(ty)
    }

    /// Create a type from parallel sequences of keys and sizes.
    pub fn from_keys_and_sizes<K: AsRef<str>>(keys: &[K], sizes: &[usize]) -> Result<Self> {
        if keys.len() != sizes.len() {
            return Err(AffineError::LengthMismatch {
                expected: keys.len(),
                actual: sizes.len(),
            });
        }
        Self::from_pairs(keys.iter().zip(sizes.iter().copied()))
    }

    /// Insert `key` with `size`, or confirm it if already present.
    ///
    /// # Errors
    ///
    /// * `SizesDoNotMatch` if `key` is present with a different size
    /// * `KeyIsNotValid` / `InvalidSize` for an empty key or a zero size
    pub fn set(&mut self, key: &str, size: usize) -> Result<()> {
        validate_entry(key, size)?;
        match self.position(key) {
            Some(pos) => {
                let existing = self.entries[pos].1;
                if existing != size {
                    return Err(AffineError::SizesDoNotMatch {
                        key: key.to_string(),
                        existing,
                        requested: size,
                    });
                }
                Ok(())
            }
            None => {
                self.entries.push((key.to_string(), size));
                Ok(())
            }
        }
    }

    /// Get the size recorded for `key`.
    pub fn get(&self, key: &str) -> Result<usize> {
        self.position(key)
            .map(|pos| self.entries[pos].1)
            .ok_or_else(|| AffineError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Check whether `key` is part of this type.
    pub fn has_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Sizes in insertion order.
    pub fn values(&self) -> Vec<usize> {
        self.entries.iter().map(|(_, size)| *size).collect()
    }

    /// Iterate over `(key, size)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.entries.iter().map(|(key, size)| (key.as_str(), *size))
    }

    /// Number of distinct keys.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// `true` for the type of a non-parametric object.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of scalar components, i.e. the length of a serialized parameter.
    pub fn dim(&self) -> usize {
        self.entries.iter().map(|(_, size)| size).sum()
    }

    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn insert_new(&mut self, key: &str, size: usize) -> Result<()> {
        validate_entry(key, size)?;
        if self.has_key(key) {
            return Err(AffineError::DuplicateKey {
                key: key.to_string(),
            });
        }
        self.entries.push((key.to_string(), size));
        Ok(())
    }
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AffineError::KeyIsNotValid {
            key: String::new(),
            known: Vec::new(),
        });
    }
    Ok(())
}

fn validate_entry(key: &str, size: usize) -> Result<()> {
    validate_key(key)?;
    if size == 0 {
        return Err(AffineError::InvalidSize {
            key: key.to_string(),
            size,
        });
    }
    Ok(())
}

impl TryFrom<Vec<(String, usize)>> for ParameterType {
    type Error = AffineError;

    fn try_from(entries: Vec<(String, usize)>) -> Result<Self> {
        Self::from_pairs(entries)
    }
}

impl From<ParameterType> for Vec<(String, usize)> {
    fn from(ty: ParameterType) -> Self {
        ty.entries
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterType(")?;
        for (i, (key, size)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, size)?;
        }
        write!(f, ")")
    }
}
