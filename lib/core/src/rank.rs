//! Percentile rank index
//!
//! For every feature, keeps the values of that feature across all indexed
//! entities sorted ascending. Rank lookups are a lower-bound binary search,
//! so the rank of a value is the number of indexed values strictly below it.

use crate::{Entity, EntityStore, Error, FeatureSchema, Result};

/// Per-feature sorted value arrays plus the indexed entity count
#[derive(Debug, Clone)]
pub struct RankIndex {
    sorted: Vec<Vec<f64>>,
    n: usize,
}

impl RankIndex {
    /// Build the index over every entity in the store
    pub fn build(store: &EntityStore) -> Result<Self> {
        Self::from_entities(store.schema(), store.iter())
    }

    /// Build the index over a subset of entities.
    ///
    /// Missing values are indexed as 0. Fails when no entity is given.
    pub fn from_entities<'a, I>(schema: &FeatureSchema, entities: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let mut sorted: Vec<Vec<f64>> = vec![Vec::new(); schema.len()];
        let mut n = 0usize;

        for entity in entities {
            if entity.dim() != schema.len() {
                return Err(Error::InvalidDimension {
                    expected: schema.len(),
                    actual: entity.dim(),
                });
            }
            for (column, value) in sorted.iter_mut().zip(&entity.features) {
                column.push(value.unwrap_or(0.0));
            }
            n += 1;
        }

        if n == 0 {
            return Err(Error::Configuration(
                "rank index requires at least one entity".to_string(),
            ));
        }

        for column in &mut sorted {
            column.sort_by(f64::total_cmp);
        }

        tracing::debug!("Rank index built: {} features over {} entities", sorted.len(), n);
        Ok(Self { sorted, n })
    }

    /// Number of indexed entities
    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn feature_count(&self) -> usize {
        self.sorted.len()
    }

    /// Count of indexed values strictly less than `value`, in `[0, n]`.
    ///
    /// # Panics
    /// Panics if `feature` is not a valid schema index.
    #[inline]
    pub fn percentile_rank(&self, feature: usize, value: f64) -> usize {
        self.sorted[feature].partition_point(|v| *v < value)
    }

    /// `percentile_rank / n`, in `[0, 1]`
    #[inline]
    pub fn percentile(&self, feature: usize, value: f64) -> f64 {
        self.percentile_rank(feature, value) as f64 / self.n as f64
    }

    /// Sorted values of one feature
    #[inline]
    pub fn sorted_values(&self, feature: usize) -> &[f64] {
        &self.sorted[feature]
    }
}
