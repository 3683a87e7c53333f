//! Attribution cache
//!
//! Runs the explainer once, batched over the full feature matrix, and keeps
//! one attribution row per entity. Every read afterwards is a lookup.

use crate::explain::{AttributionComparison, FeatureAttribution, FeatureGain};
use ahash::AHashMap;
use rankx_core::{EntityId, EntityStore, Error, Explainer, FeatureSchema, Result};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;

/// Per-entity, per-feature attribution values indexed by entity id
#[derive(Debug)]
pub struct AttributionCache {
    schema: Arc<FeatureSchema>,
    ids: Vec<EntityId>,
    positions: AHashMap<EntityId, usize>,
    /// One row per entity, schema order
    attributions: Vec<Vec<f64>>,
    /// Realized feature values for display; `None` where missing
    realized: Vec<Vec<Option<f64>>>,
    model_version: String,
    fingerprint: String,
}

impl AttributionCache {
    /// Explain every entity in one batched call.
    ///
    /// Missing values are defaulted to 0 before explanation, the same input
    /// the predictor sees.
    pub fn build(store: &EntityStore, explainer: &dyn Explainer) -> Result<Self> {
        let started = Instant::now();
        let matrix = store.feature_matrix();
        let width = store.schema().len();

        let attributions = explainer.explain(&matrix)?;
        if attributions.len() != matrix.len() {
            return Err(Error::Model(format!(
                "explainer returned {} rows for {} entities",
                attributions.len(),
                matrix.len()
            )));
        }
        for (row, entity) in attributions.iter().zip(store.iter()) {
            if row.len() != width {
                return Err(Error::InvalidDimension {
                    expected: width,
                    actual: row.len(),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(Error::Model(format!(
                    "non-finite attribution for entity {}",
                    entity.id
                )));
            }
        }

        let ids: Vec<EntityId> = store.ids().cloned().collect();
        let positions = ids
            .iter()
            .enumerate()
            .map(|(row, id)| (id.clone(), row))
            .collect();
        let realized = store.iter().map(|e| e.features.clone()).collect();
        let model_version = explainer.model_version();
        let fingerprint = fingerprint(store, &matrix);

        tracing::info!(
            "Attribution cache built: {} entities x {} features in {:?} (model {})",
            ids.len(),
            width,
            started.elapsed(),
            model_version
        );

        Ok(Self {
            schema: store.schema_arc(),
            ids,
            positions,
            attributions,
            realized,
            model_version,
            fingerprint,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[inline]
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// SHA-256 of the schema and the feature matrix the cache was built from
    #[inline]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Whether the cache still matches this dataset and model version.
    ///
    /// A `false` means every cached row is stale and the cache must be rebuilt.
    pub fn is_consistent_with(&self, store: &EntityStore, model_version: &str) -> bool {
        self.model_version == model_version
            && self.fingerprint == fingerprint(store, &store.feature_matrix())
    }

    /// Raw attribution row for an entity, schema order
    pub fn row(&self, id: &EntityId) -> Result<&[f64]> {
        self.positions
            .get(id)
            .map(|&row| self.attributions[row].as_slice())
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))
    }

    /// Attribution and realized value of every feature, schema order
    pub fn get(&self, id: &EntityId) -> Result<Vec<FeatureAttribution>> {
        let row = *self
            .positions
            .get(id)
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))?;

        Ok(self
            .schema
            .names()
            .iter()
            .zip(&self.attributions[row])
            .zip(&self.realized[row])
            .map(|((feature, &attribution), &value)| FeatureAttribution {
                feature: feature.clone(),
                attribution,
                value,
            })
            .collect())
    }

    /// The `n` features with the largest absolute attribution.
    ///
    /// Equal magnitudes keep schema order.
    pub fn top_by_magnitude(&self, id: &EntityId, n: usize) -> Result<Vec<FeatureAttribution>> {
        let mut attributions = self.get(id)?;
        attributions.sort_by(|a, b| b.attribution.abs().total_cmp(&a.attribution.abs()));
        attributions.truncate(n);
        Ok(attributions)
    }

    /// Mean attribution per feature over a cohort, schema order
    pub fn mean_over(&self, cohort: &[EntityId]) -> Result<Vec<f64>> {
        if cohort.is_empty() {
            return Err(Error::Validation("cohort is empty".to_string()));
        }

        let mut sums = vec![0.0; self.schema.len()];
        for id in cohort {
            for (sum, value) in sums.iter_mut().zip(self.row(id)?) {
                *sum += value;
            }
        }

        let count = cohort.len() as f64;
        for sum in &mut sums {
            *sum /= count;
        }
        Ok(sums)
    }

    /// Features ranked by `cohort mean - entity attribution`, descending.
    pub fn gain(&self, id: &EntityId, cohort: &[EntityId], top_n: usize) -> Result<Vec<FeatureGain>> {
        let reference = self.mean_over(cohort)?;
        self.gain_against(id, &reference, top_n)
    }

    /// Gain against a precomputed reference profile (e.g. from [`Self::mean_over`]).
    ///
    /// Equal gains keep schema order.
    pub fn gain_against(
        &self,
        id: &EntityId,
        reference: &[f64],
        top_n: usize,
    ) -> Result<Vec<FeatureGain>> {
        if reference.len() != self.schema.len() {
            return Err(Error::InvalidDimension {
                expected: self.schema.len(),
                actual: reference.len(),
            });
        }
        let row = self.row(id)?;

        let mut gains: Vec<FeatureGain> = self
            .schema
            .names()
            .iter()
            .zip(reference.iter().zip(row))
            .map(|(feature, (mean, own))| FeatureGain {
                feature: feature.clone(),
                gain: mean - own,
            })
            .collect();

        gains.sort_by(|a, b| b.gain.total_cmp(&a.gain));
        gains.truncate(top_n);
        Ok(gains)
    }

    /// Side-by-side attributions of two entities, schema order
    pub fn compare(&self, first: &EntityId, second: &EntityId) -> Result<Vec<AttributionComparison>> {
        let a = self.row(first)?;
        let b = self.row(second)?;

        Ok(self
            .schema
            .names()
            .iter()
            .zip(a.iter().zip(b))
            .map(|(feature, (&first, &second))| AttributionComparison {
                feature: feature.clone(),
                first,
                second,
                difference: second - first,
            })
            .collect())
    }

    /// Mean absolute attribution per feature over every cached entity
    pub fn mean_abs(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.schema.len()];
        for row in &self.attributions {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value.abs();
            }
        }
        let count = self.attributions.len().max(1) as f64;
        sums.into_iter().map(|s| s / count).collect()
    }

    /// Entity ids in cache row order
    #[inline]
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Attribution row by position
    #[inline]
    pub(crate) fn row_at(&self, row: usize) -> &[f64] {
        &self.attributions[row]
    }

    /// Realized values by position
    #[inline]
    pub(crate) fn realized_at(&self, row: usize) -> &[Option<f64>] {
        &self.realized[row]
    }
}

/// Digest of the schema and every `(id, row)` pair, in row order
fn fingerprint(store: &EntityStore, matrix: &[Vec<f64>]) -> String {
    let mut hasher = Sha256::new();
    for name in store.schema().names() {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    for (id, row) in store.ids().zip(matrix) {
        match id {
            EntityId::Integer(i) => {
                hasher.update([b'i']);
                hasher.update(i.to_le_bytes());
            }
            EntityId::String(s) => {
                hasher.update([b's']);
                hasher.update(s.as_bytes());
                hasher.update([0u8]);
            }
        }
        for value in row {
            hasher.update(value.to_bits().to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankx_core::{Entity, LinearModel};

    fn store() -> EntityStore {
        let schema = FeatureSchema::new(["f1", "f2", "f3"]).unwrap();
        EntityStore::new(
            schema,
            vec![
                Entity::from_values(1, &[1.0, 2.0, 3.0]),
                Entity::from_values(2, &[4.0, 0.0, -1.0]),
                Entity::new(3, vec![Some(2.0), None, Some(1.0)]),
            ],
        )
        .unwrap()
    }

    fn model() -> LinearModel {
        LinearModel::new(
            vec!["f1".into(), "f2".into(), "f3".into()],
            0.5,
            vec![1.0, -2.0, 0.5],
        )
        .with_version("test")
    }

    fn cache() -> AttributionCache {
        AttributionCache::build(&store(), &model()).unwrap()
    }

    /// Explainer returning one row too few
    struct ShortExplainer;

    impl Explainer for ShortExplainer {
        fn explain(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
            Ok(matrix.iter().skip(1).cloned().collect())
        }
    }

    /// Explainer that always fails
    struct FailingExplainer;

    impl Explainer for FailingExplainer {
        fn explain(&self, _matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
            Err(Error::Model("explainer offline".to_string()))
        }
    }

    #[test]
    fn test_batched_matches_single_row() {
        let store = store();
        let model = model();
        let cache = AttributionCache::build(&store, &model).unwrap();

        for entity in store.iter() {
            let single = model.explain(&[entity.dense()]).unwrap();
            assert_eq!(cache.row(&entity.id).unwrap(), single[0].as_slice());
        }
    }

    #[test]
    fn test_get_includes_realized_values() {
        let cache = cache();
        let row = cache.get(&EntityId::from(3)).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row[1].feature, "f2");
        assert_eq!(row[1].value, None);
        assert_eq!(row[1].attribution, 0.0);
        assert_eq!(row[0].value, Some(2.0));
        assert_eq!(row[0].attribution, 2.0);
    }

    #[test]
    fn test_unknown_entity() {
        let cache = cache();
        let missing = EntityId::from(42);
        assert!(matches!(cache.get(&missing), Err(Error::EntityNotFound(_))));
        assert!(matches!(cache.top_by_magnitude(&missing, 2), Err(Error::EntityNotFound(_))));
        assert!(matches!(
            cache.mean_over(&[EntityId::from(1), missing.clone()]),
            Err(Error::EntityNotFound(_))
        ));
        assert!(matches!(
            cache.compare(&EntityId::from(1), &missing),
            Err(Error::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_top_by_magnitude() {
        let cache = cache();
        // entity 1: [1.0, -4.0, 1.5]
        let top = cache.top_by_magnitude(&EntityId::from(1), 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].feature, "f2");
        assert_eq!(top[1].feature, "f3");
    }

    #[test]
    fn test_mean_over() {
        let cache = cache();
        // entity 1: [1, -4, 1.5], entity 2: [4, 0, -0.5]
        let mean = cache.mean_over(&[EntityId::from(1), EntityId::from(2)]).unwrap();
        assert_eq!(mean, vec![2.5, -2.0, 0.5]);
        assert!(matches!(cache.mean_over(&[]), Err(Error::Validation(_))));
    }

    #[test]
    fn test_gain_sorted_and_truncated() {
        let cache = cache();
        // reference = entity 2 alone: [4, 0, -0.5]; entity 1: [1, -4, 1.5]
        let gains = cache
            .gain(&EntityId::from(1), &[EntityId::from(2)], 2)
            .unwrap();
        assert_eq!(gains.len(), 2);
        assert_eq!(gains[0].feature, "f2");
        assert_eq!(gains[0].gain, 4.0);
        assert_eq!(gains[1].feature, "f1");
        assert_eq!(gains[1].gain, 3.0);

        let all = cache.gain(&EntityId::from(1), &[EntityId::from(2)], 10).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].gain >= w[1].gain));
    }

    #[test]
    fn test_gain_against_self_is_zero() {
        let cache = cache();
        let id = EntityId::from(2);
        let gains = cache.gain(&id, &[id.clone()], 3).unwrap();
        assert!(gains.iter().all(|g| g.gain == 0.0));
    }

    #[test]
    fn test_compare() {
        let cache = cache();
        let rows = cache.compare(&EntityId::from(1), &EntityId::from(2)).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].feature, "f1");
        assert_eq!(rows[0].difference, 3.0);
        assert_eq!(rows[1].difference, 4.0);
    }

    #[test]
    fn test_consistency_fingerprint() {
        let store = store();
        let cache = AttributionCache::build(&store, &model()).unwrap();
        assert_eq!(cache.model_version(), "linear/test");
        assert!(cache.is_consistent_with(&store, "linear/test"));
        assert!(!cache.is_consistent_with(&store, "linear/other"));

        let changed = EntityStore::new(
            FeatureSchema::new(["f1", "f2", "f3"]).unwrap(),
            vec![Entity::from_values(1, &[1.0, 2.0, 3.5])],
        )
        .unwrap();
        assert!(!cache.is_consistent_with(&changed, "linear/test"));
    }

    #[test]
    fn test_swapped_ids_are_inconsistent() {
        let schema = || FeatureSchema::new(["f1"]).unwrap();
        let model = LinearModel::new(vec!["f1".into()], 0.0, vec![1.0]).with_version("test");
        let original = EntityStore::new(
            schema(),
            vec![Entity::from_values(1, &[1.0]), Entity::from_values(2, &[5.0])],
        )
        .unwrap();
        let swapped = EntityStore::new(
            schema(),
            vec![Entity::from_values(2, &[1.0]), Entity::from_values(1, &[5.0])],
        )
        .unwrap();

        let cache = AttributionCache::build(&original, &model).unwrap();
        assert!(cache.is_consistent_with(&original, "linear/test"));
        assert!(!cache.is_consistent_with(&swapped, "linear/test"));
        assert_eq!(cache.row(&EntityId::from(1)).unwrap(), &[1.0]);
    }

    #[test]
    fn test_explainer_failures() {
        let store = store();
        assert!(matches!(
            AttributionCache::build(&store, &ShortExplainer),
            Err(Error::Model(_))
        ));
        assert!(matches!(
            AttributionCache::build(&store, &FailingExplainer),
            Err(Error::Model(_))
        ));
    }
}
