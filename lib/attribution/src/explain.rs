//! Explanation payloads
//!
//! Output structures built from the attribution cache: per-entity rows,
//! gains, pairwise comparisons and the dataset-wide summary.

use crate::cache::AttributionCache;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rankx_core::{EntityId, EntityStore};
use serde::Serialize;

/// Attribution of one feature for one entity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureAttribution {
    pub feature: String,
    pub attribution: f64,
    /// Realized feature value, `None` when missing in the source data
    pub value: Option<f64>,
}

/// How much an entity's attribution trails the reference cohort on a feature
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureGain {
    pub feature: String,
    pub gain: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttributionComparison {
    pub feature: String,
    pub first: f64,
    pub second: f64,
    /// `second - first`
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub mean_abs_attribution: f64,
}

/// One dot of the summary plot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryPoint {
    pub entity_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    /// Position of the feature in [`AttributionSummary::features`]
    pub feature_index: usize,
    pub attribution: f64,
    /// Feature value min-max scaled over the sample, 0 for constant features
    pub normalized_value: f64,
}

/// Dataset-wide view of the attributions
#[derive(Debug, Clone, Serialize)]
pub struct AttributionSummary {
    /// Most important features, least important first (plot order)
    pub features: Vec<String>,
    /// Every feature by mean absolute attribution, most important first
    pub importance: Vec<FeatureImportance>,
    pub points: Vec<SummaryPoint>,
    pub sample_size: usize,
}

/// Parameters of [`AttributionSummary::compute`]
#[derive(Debug, Clone, Copy)]
pub struct SummaryOptions {
    pub top_features: usize,
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            top_features: 15,
            max_samples: 500,
            seed: 42,
        }
    }
}

impl AttributionSummary {
    /// Rank features by mean absolute attribution and sample plot points.
    ///
    /// The sample is drawn without replacement with a seeded generator, so
    /// the same options always produce the same summary.
    pub fn compute(cache: &AttributionCache, store: &EntityStore, options: SummaryOptions) -> Self {
        let names = cache.schema().names();
        let mut importance: Vec<FeatureImportance> = names
            .iter()
            .zip(cache.mean_abs())
            .map(|(feature, mean_abs_attribution)| FeatureImportance {
                feature: feature.clone(),
                mean_abs_attribution,
            })
            .collect();
        importance.sort_by(|a, b| b.mean_abs_attribution.total_cmp(&a.mean_abs_attribution));

        let mut top: Vec<usize> = importance
            .iter()
            .take(options.top_features)
            .filter_map(|imp| cache.schema().position(&imp.feature))
            .collect();
        top.reverse();

        let amount = options.max_samples.min(cache.len());
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut sample = rand::seq::index::sample(&mut rng, cache.len(), amount).into_vec();
        sample.sort_unstable();

        let mut points = Vec::with_capacity(sample.len() * top.len());
        for (feature_index, &feature) in top.iter().enumerate() {
            let values: Vec<f64> = sample
                .iter()
                .map(|&row| cache.realized_at(row)[feature].unwrap_or(0.0))
                .collect();
            let (min, max) = values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

            for (&row, &value) in sample.iter().zip(&values) {
                let id = &cache.ids()[row];
                let normalized_value = if max > min { (value - min) / (max - min) } else { 0.0 };
                points.push(SummaryPoint {
                    entity_id: id.clone(),
                    entity_name: store.get(id).ok().and_then(|e| e.name.clone()),
                    feature_index,
                    attribution: cache.row_at(row)[feature],
                    normalized_value,
                });
            }
        }

        let features = top
            .iter()
            .filter_map(|&f| cache.schema().name(f).map(str::to_string))
            .collect();

        Self {
            features,
            importance,
            points,
            sample_size: sample.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankx_core::{Entity, FeatureSchema, LinearModel};

    fn fixture() -> (EntityStore, AttributionCache) {
        let schema = FeatureSchema::new(["small", "large", "flat"]).unwrap();
        let entities: Vec<Entity> = (0..20u64)
            .map(|i| {
                Entity::from_values(i, &[i as f64, (i * 3) as f64, 1.0])
                    .with_name(format!("School {}", i))
            })
            .collect();
        let store = EntityStore::new(schema, entities).unwrap();
        let model = LinearModel::new(
            vec!["small".into(), "large".into(), "flat".into()],
            0.0,
            vec![0.1, 1.0, 5.0],
        )
        .with_baseline(vec![0.0, 0.0, 1.0]);
        let cache = AttributionCache::build(&store, &model).unwrap();
        (store, cache)
    }

    #[test]
    fn test_importance_order() {
        let (store, cache) = fixture();
        let summary = AttributionSummary::compute(&cache, &store, SummaryOptions::default());
        let order: Vec<_> = summary.importance.iter().map(|i| i.feature.as_str()).collect();
        assert_eq!(order, vec!["large", "small", "flat"]);
        // Plot order is least important first
        assert_eq!(summary.features, vec!["flat", "small", "large"]);
    }

    #[test]
    fn test_sampling_is_bounded_and_deterministic() {
        let (store, cache) = fixture();
        let options = SummaryOptions {
            top_features: 2,
            max_samples: 5,
            seed: 7,
        };
        let a = AttributionSummary::compute(&cache, &store, options);
        let b = AttributionSummary::compute(&cache, &store, options);

        assert_eq!(a.sample_size, 5);
        assert_eq!(a.features.len(), 2);
        assert_eq!(a.points.len(), 10);
        assert_eq!(a.points, b.points);
        assert!(a.points.iter().all(|p| p.entity_name.is_some()));
    }

    #[test]
    fn test_normalized_values() {
        let (store, cache) = fixture();
        let summary = AttributionSummary::compute(&cache, &store, SummaryOptions::default());
        assert_eq!(summary.sample_size, 20);

        for point in &summary.points {
            assert!((0.0..=1.0).contains(&point.normalized_value));
        }
        // "flat" is constant over the sample
        let flat = summary.features.iter().position(|f| f == "flat").unwrap();
        assert!(summary
            .points
            .iter()
            .filter(|p| p.feature_index == flat)
            .all(|p| p.normalized_value == 0.0));
    }

    #[test]
    fn test_serialization() {
        let (store, cache) = fixture();
        let summary = AttributionSummary::compute(&cache, &store, SummaryOptions::default());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"features\""));
        assert!(json.contains("\"normalized_value\""));
    }
}
