//! Feature schema
//!
//! The ordered list of feature names shared by the model and every entity.
//! Dict-shaped request input (overrides, hypothetical vectors, context
//! subsets) is validated here and converted to schema-indexed vectors before
//! it reaches distance or prediction code.

use crate::{Error, Result};
use ahash::AHashMap;
use serde::Serialize;

/// Fixed, ordered, duplicate-free list of feature names
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSchema {
    names: Vec<String>,
    #[serde(skip)]
    positions: AHashMap<String, usize>,
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl FeatureSchema {
    /// Create a schema from feature names in model order
    ///
    /// Fails when the list is empty, contains a blank name or a duplicate.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(Error::Configuration("feature schema cannot be empty".to_string()));
        }

        let mut positions = AHashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "feature at position {} has an empty name",
                    i
                )));
            }
            if positions.insert(name.clone(), i).is_some() {
                return Err(Error::Configuration(format!(
                    "feature '{}' appears more than once in the schema",
                    name
                )));
            }
        }

        Ok(Self { names, positions })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    #[inline]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Indices of every feature, in schema order
    pub fn all_indices(&self) -> Vec<usize> {
        (0..self.names.len()).collect()
    }

    /// Resolve a context subset of feature names to schema indices.
    ///
    /// Unknown names are skipped and duplicates collapsed, keeping first
    /// occurrence order. An empty request selects every feature. A non-empty
    /// request in which no name is known is rejected.
    pub fn resolve_subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        if names.is_empty() {
            return Ok(self.all_indices());
        }

        let mut seen = vec![false; self.names.len()];
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            match self.position(name.as_ref()) {
                Some(i) if !seen[i] => {
                    seen[i] = true;
                    indices.push(i);
                }
                Some(_) => {}
                None => tracing::debug!("ignoring unknown context feature '{}'", name.as_ref()),
            }
        }

        if indices.is_empty() {
            return Err(Error::Validation(
                "context features reference no known feature".to_string(),
            ));
        }
        Ok(indices)
    }

    /// Convert a name-keyed hypothetical vector to a dense schema vector.
    ///
    /// Absent features default to 0 and unknown names are ignored.
    /// Non-finite values are rejected.
    pub fn dense_from_pairs<I, K>(&self, pairs: I) -> Result<Vec<f64>>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut dense = vec![0.0; self.names.len()];
        for (i, value) in self.overrides_from_pairs(pairs)? {
            dense[i] = value;
        }
        Ok(dense)
    }

    /// Convert name-keyed overrides to `(index, value)` pairs in schema order.
    ///
    /// Unknown names are ignored. Non-finite values are rejected. When a name
    /// is repeated the last value wins.
    pub fn overrides_from_pairs<I, K>(&self, pairs: I) -> Result<Vec<(usize, f64)>>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut slots: Vec<Option<f64>> = vec![None; self.names.len()];
        for (name, value) in pairs {
            let name = name.as_ref();
            let Some(i) = self.position(name) else {
                tracing::debug!("ignoring unknown feature '{}'", name);
                continue;
            };
            if !value.is_finite() {
                return Err(Error::Validation(format!(
                    "feature '{}' has a non-finite value",
                    name
                )));
            }
            slots[i] = Some(value);
        }

        Ok(slots
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
            .collect())
    }
}
