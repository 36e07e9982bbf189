//! Concrete parameter values
//!
//! A [`Parameter`] assigns a vector of doubles to every key of its
//! [`ParameterType`]. The type is kept alongside the values and is updated only
//! through [`Parameter::set`].

use crate::error::{AffineError, Result};
use crate::parameters::parameter_type::{validate_key, ParameterType};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A point `μ` of a parameter space
///
/// # Examples
///
/// ```
/// use affine_decomp::parameters::Parameter;
///
/// let mu = Parameter::from_pairs([("diffusion", vec![1.0, 2.0]), ("force", vec![3.0])]).unwrap();
/// assert_eq!(mu.get("force").unwrap(), &[3.0]);
/// assert_eq!(mu.serialize(), vec![1.0, 2.0, 3.0]);
/// assert_eq!(mu.parameter_type().values(), vec![2, 1]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, Vec<f64>)>", into = "Vec<(String, Vec<f64>)>")]
pub struct Parameter {
    /// Induced type; keys and sizes in insertion order
    ty: ParameterType,

    /// One value vector per key of `ty`, same order
    values: Vec<Vec<f64>>,
}

impl Parameter {
    /// Create an empty parameter, the only valid argument for non-parametric objects.
    pub fn new() -> Self {
        Self {
            ty: ParameterType::new(),
            values: Vec::new(),
        }
    }

    /// Create a parameter with a single scalar component.
    pub fn single(key: &str, value: f64) -> Result<Self> {
        let mut mu = Self::new();
        mu.set(key, vec![value])?;
        Ok(mu)
    }

    /// Create a parameter from `(key, values)` pairs, in the given order.
    ///
    /// # Errors
    ///
    /// * `KeyIsNotValid` for an empty key
    /// * `InvalidSize` for an empty value vector
    /// * `DuplicateKey` if a key appears twice
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Vec<f64>>,
    {
        let mut mu = Self::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            if mu.has_key(key) {
                return Err(AffineError::DuplicateKey {
                    key: key.to_string(),
                });
            }
            mu.set(key, value.into())?;
        }
        Ok(mu)
    }

    /// Create a parameter from parallel sequences of keys and value vectors.
    pub fn from_keys_and_values<K: AsRef<str>>(keys: &[K], values: &[Vec<f64>]) -> Result<Self> {
        if keys.len() != values.len() {
            return Err(AffineError::LengthMismatch {
                expected: keys.len(),
                actual: values.len(),
            });
        }
        Self::from_pairs(keys.iter().zip(values.iter().cloned()))
    }

    /// Create a parameter of type `ty` from one value vector per key.
    ///
    /// # Errors
    ///
    /// * `LengthMismatch` if the number of value vectors differs from `ty.size()`
    /// * `SizesDoNotMatch` if a value vector does not have the size `ty` records
    pub fn with_type(ty: &ParameterType, values: Vec<Vec<f64>>) -> Result<Self> {
        if ty.size() != values.len() {
            return Err(AffineError::LengthMismatch {
                expected: ty.size(),
                actual: values.len(),
            });
        }
        for ((key, size), value) in ty.iter().zip(values.iter()) {
            if value.len() != size {
                return Err(AffineError::SizesDoNotMatch {
                    key: key.to_string(),
                    existing: size,
                    requested: value.len(),
                });
            }
        }
        Ok(Self {
            ty: ty.clone(),
            values: values.into_iter().map(normalized).collect(),
        })
    }

    /// Rebuild a parameter of type `ty` from its flattened form.
    ///
    /// This is the inverse of [`Parameter::serialize`].
    pub fn deserialize(ty: &ParameterType, flat: &[f64]) -> Result<Self> {
        if ty.dim() != flat.len() {
            return Err(AffineError::LengthMismatch {
                expected: ty.dim(),
                actual: flat.len(),
            });
        }
        let mut offset = 0;
        let mut values = Vec::with_capacity(ty.size());
        for (_, size) in ty.iter() {
            values.push(normalized(flat[offset..offset + size].to_vec()));
            offset += size;
        }
        Ok(Self {
            ty: ty.clone(),
            values,
        })
    }

    /// Insert or overwrite the value of `key`.
    ///
    /// # Errors
    ///
    /// * `SizesDoNotMatch` if `key` already holds a value of a different length
    /// * `KeyIsNotValid` / `InvalidSize` for an empty key or an empty value
    pub fn set(&mut self, key: &str, value: Vec<f64>) -> Result<()> {
        validate_key(key)?;
        self.ty.set(key, value.len())?;
        let value = normalized(value);
        match self.ty.position(key) {
            Some(pos) if pos < self.values.len() => self.values[pos] = value,
            _ => self.values.push(value),
        }
        Ok(())
    }

    /// Get the value of `key`.
    pub fn get(&self, key: &str) -> Result<&[f64]> {
        self.ty
            .position(key)
            .map(|pos| self.values[pos].as_slice())
            .ok_or_else(|| AffineError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Check whether `key` is part of this parameter.
    pub fn has_key(&self, key: &str) -> bool {
        self.ty.has_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<&str> {
        self.ty.keys()
    }

    /// Value vectors in insertion order.
    pub fn values(&self) -> Vec<&[f64]> {
        self.values.iter().map(Vec::as_slice).collect()
    }

    /// Iterate over `(key, value)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.ty
            .iter()
            .zip(self.values.iter())
            .map(|((key, _), value)| (key, value.as_slice()))
    }

    /// Number of distinct keys.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The type induced by the keys and value lengths of this parameter.
    pub fn parameter_type(&self) -> &ParameterType {
        &self.ty
    }

    /// Flatten all value vectors, in key order, into one vector.
    ///
    /// The position of `key[i]` in the result is the slot coefficient
    /// expressions bind that variable to.
    pub fn serialize(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// Extract the sub-parameter with exactly the keys of `ty`, in `ty`'s order.
    ///
    /// `self` may carry additional keys. This is also the way to reorder a
    /// parameter into the key order an object expects.
    ///
    /// # Errors
    ///
    /// * `WrongParameterType` if a key of `ty` is missing or has a different size
    pub fn restrict_to(&self, ty: &ParameterType) -> Result<Self> {
        let mut values = Vec::with_capacity(ty.size());
        for (key, size) in ty.iter() {
            match self.ty.position(key) {
                Some(pos) if self.values[pos].len() == size => values.push(self.values[pos].clone()),
                _ => {
                    return Err(AffineError::WrongParameterType {
                        expected: ty.clone(),
                        actual: self.ty.clone(),
                    })
                }
            }
        }
        Ok(Self {
            ty: ty.clone(),
            values,
        })
    }

    /// Serialize the parameter to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a parameter from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the parameter to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a parameter from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }
}

impl TryFrom<Vec<(String, Vec<f64>)>> for Parameter {
    type Error = AffineError;

    fn try_from(entries: Vec<(String, Vec<f64>)>) -> Result<Self> {
        Self::from_pairs(entries)
    }
}

impl From<Parameter> for Vec<(String, Vec<f64>)> {
    fn from(mu: Parameter) -> Self {
        let keys: Vec<String> = mu.ty.keys().into_iter().map(str::to_string).collect();
        keys.into_iter().zip(mu.values).collect()
    }
}

// Values are compared with `f64::total_cmp`, so equality agrees with the order.
// Stored values never hold -0.0, which keeps 0.0 and -0.0 equal. NaN equals itself.
impl Ord for Parameter {
    fn cmp(&self, other: &Self) -> Ordering {
        for ((key, value), (other_key, other_value)) in self.iter().zip(other.iter()) {
            let ordering = key.cmp(other_key).then_with(|| {
                value
                    .iter()
                    .zip(other_value.iter())
                    .map(|(a, b)| a.total_cmp(b))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or_else(|| value.len().cmp(&other_value.len()))
            });
            if ordering.is_ne() {
                return ordering;
            }
        }
        self.size().cmp(&other.size())
    }
}

impl PartialOrd for Parameter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Parameter {}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter(")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": [", key)?;
            for (j, v) in value.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
            write!(f, "]")?;
        }
        write!(f, ")")
    }
}

/// Replace -0.0 by 0.0.
fn normalized(mut value: Vec<f64>) -> Vec<f64> {
    for v in value.iter_mut() {
        *v += 0.0;
    }
    value
}
