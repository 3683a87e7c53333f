//! Dashboard context
//!
//! The single, explicitly constructed object request handlers read from.
//! [`DashboardContext::build`] runs the whole build phase once, in order:
//! rank index and similarity candidates, attribution cache, reference
//! cohort, fit metrics, global summary. Any failure aborts the build, so a
//! process never serves from a partially built context. After the build
//! nothing is mutated and the context can be shared freely across threads.

use crate::payload::{
    CounterfactualRequest, EntityDashboard, EntityDetails, EntitySummary, FeatureValue,
    GainReport, SimilarEntity, SimilarRequest,
};
use rankx_attribution::{
    AttributionCache, AttributionComparison, AttributionSummary, Cohort, SummaryOptions,
};
use rankx_core::{
    CounterfactualEvaluator, EntityId, EntityStore, Error, Explainer, FitMetrics, Predictor,
    Result, Simulation,
};
use rankx_similarity::{Neighbor, SimilarityEngine};
use std::sync::Arc;
use std::time::Instant;

/// Tunables of the dashboard
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Entities removed from similarity candidates and the rank index
    pub excluded: Vec<EntityId>,
    /// Neighbours shown on an entity dashboard
    pub neighbors: usize,
    /// Default result count for hypothetical-vector search
    pub similar_results: usize,
    pub gain_top_n: usize,
    /// Outcome quantile defining the reference cohort
    pub reference_quantile: f64,
    pub summary: SummaryOptions,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            excluded: Vec::new(),
            neighbors: 8,
            similar_results: 5,
            gain_top_n: 10,
            reference_quantile: 0.9,
            summary: SummaryOptions::default(),
        }
    }
}

/// Reference cohort with its mean attribution profile
struct Reference {
    cohort: Cohort,
    profile: Vec<f64>,
}

pub struct DashboardContext {
    config: ContextConfig,
    store: Arc<EntityStore>,
    predictor: Arc<dyn Predictor>,
    similarity: SimilarityEngine,
    attributions: AttributionCache,
    counterfactual: CounterfactualEvaluator,
    reference: Option<Reference>,
    fit: Option<FitMetrics>,
    summary: AttributionSummary,
}

impl DashboardContext {
    /// Build from a model that both predicts and explains
    pub fn build<M>(store: EntityStore, model: M, config: ContextConfig) -> Result<Self>
    where
        M: Predictor + Explainer + 'static,
    {
        let model = Arc::new(model);
        Self::build_with(store, model.clone(), model.as_ref(), config)
    }

    /// Build from separate predictor and explainer collaborators
    pub fn build_with(
        store: EntityStore,
        predictor: Arc<dyn Predictor>,
        explainer: &dyn Explainer,
        config: ContextConfig,
    ) -> Result<Self> {
        let started = Instant::now();
        let predictor_version = predictor.model_version();
        let explainer_version = explainer.model_version();
        if predictor_version != explainer_version {
            return Err(Error::Configuration(format!(
                "predictor is model {} but explainer is model {}",
                predictor_version, explainer_version
            )));
        }
        let store = Arc::new(store);

        let similarity = SimilarityEngine::new(store.clone(), &config.excluded)?;
        let attributions = AttributionCache::build(&store, explainer)?;
        let counterfactual = CounterfactualEvaluator::new(store.clone(), predictor.clone());

        let reference = if store.iter().any(|e| e.outcome.is_some()) {
            let cohort = Cohort::top_quantile(&store, config.reference_quantile)?;
            let profile = attributions.mean_over(cohort.members())?;
            Some(Reference { cohort, profile })
        } else {
            tracing::warn!("No entity has a recorded outcome, gain ranking disabled");
            None
        };

        let fit = fit_metrics(&store, predictor.as_ref())?;
        if let Some(fit) = &fit {
            tracing::info!(
                "Model fit over {} entities: RMSE {:.4}, MAE {:.4}, MAPE {:.4}, R2 {:.4}, max error {:.4}",
                fit.samples,
                fit.rmse,
                fit.mae,
                fit.mape,
                fit.r2,
                fit.max_error
            );
        }

        let summary = AttributionSummary::compute(&attributions, &store, config.summary);

        tracing::info!("Dashboard context built in {:?}", started.elapsed());

        Ok(Self {
            config,
            store,
            predictor,
            similarity,
            attributions,
            counterfactual,
            reference,
            fit,
            summary,
        })
    }

    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    #[inline]
    pub fn similarity(&self) -> &SimilarityEngine {
        &self.similarity
    }

    #[inline]
    pub fn attributions(&self) -> &AttributionCache {
        &self.attributions
    }

    #[inline]
    pub fn fit_metrics(&self) -> Option<&FitMetrics> {
        self.fit.as_ref()
    }

    #[inline]
    pub fn reference_cohort(&self) -> Option<&Cohort> {
        self.reference.as_ref().map(|r| &r.cohort)
    }

    #[inline]
    pub fn summary(&self) -> &AttributionSummary {
        &self.summary
    }

    /// Every entity that has a name
    pub fn list_entities(&self) -> Vec<EntitySummary> {
        self.store
            .iter()
            .filter_map(|e| {
                e.name.as_ref().map(|name| EntitySummary {
                    id: e.id.clone(),
                    name: name.clone(),
                })
            })
            .collect()
    }

    /// Realized features, attributions, neighbours and prediction of one entity
    pub fn dashboard(&self, id: &EntityId) -> Result<EntityDashboard> {
        let entity = self.store.get(id)?;

        let mut attributions = self.attributions.get(id)?;
        attributions.sort_by(|a, b| a.attribution.total_cmp(&b.attribution));

        let neighbors = self.similarity.neighbors_of(id, self.config.neighbors)?;
        let prediction = self.predictor.predict(&entity.dense())?;

        let features = self
            .store
            .schema()
            .names()
            .iter()
            .zip(&entity.features)
            .map(|(feature, &value)| FeatureValue {
                feature: feature.clone(),
                value,
            })
            .collect();

        Ok(EntityDashboard {
            entity: EntityDetails {
                id: entity.id.clone(),
                name: entity.name.clone(),
                outcome: entity.outcome,
                features,
                attributes: entity.attributes.clone(),
            },
            attributions,
            similar: self.resolve(neighbors),
            prediction,
        })
    }

    pub fn compare(&self, first: &EntityId, second: &EntityId) -> Result<Vec<AttributionComparison>> {
        self.attributions.compare(first, second)
    }

    pub fn simulate(&self, request: &CounterfactualRequest) -> Result<Simulation> {
        self.counterfactual
            .simulate_named(&request.entity_id, request.features.iter().map(|(k, v)| (k, *v)))
    }

    /// Real entities closest to a hypothetical feature vector
    pub fn find_similar(&self, request: &SimilarRequest) -> Result<Vec<SimilarEntity>> {
        let limit = request.limit.unwrap_or(self.config.similar_results);
        let context = request.context_features.as_deref().unwrap_or(&[]);
        let neighbors = self.similarity.find_nearest_named(
            request.features.iter().map(|(k, v)| (k, *v)),
            limit,
            context,
        )?;
        Ok(self.resolve(neighbors))
    }

    /// Features where the entity trails the reference cohort the most
    pub fn gain(&self, id: &EntityId) -> Result<GainReport> {
        let reference = self.reference.as_ref().ok_or_else(|| {
            Error::Validation("no reference cohort: dataset has no outcomes".to_string())
        })?;
        let gains = self
            .attributions
            .gain_against(id, &reference.profile, self.config.gain_top_n)?;

        Ok(GainReport {
            entity_id: id.clone(),
            cohort: reference.cohort.name.clone(),
            cohort_size: reference.cohort.len(),
            gains,
        })
    }

    fn resolve(&self, neighbors: Vec<Neighbor>) -> Vec<SimilarEntity> {
        neighbors
            .into_iter()
            .filter_map(|n| {
                let entity = self.store.get(&n.id).ok()?;
                Some(SimilarEntity {
                    id: n.id,
                    name: entity.name.clone(),
                    outcome: entity.outcome,
                    distance: n.distance,
                    attributes: entity.attributes.clone(),
                })
            })
            .collect()
    }
}

fn fit_metrics(store: &EntityStore, predictor: &dyn Predictor) -> Result<Option<FitMetrics>> {
    let mut y_true = Vec::new();
    let mut y_pred = Vec::new();
    for entity in store.iter() {
        if let Some(outcome) = entity.outcome {
            y_true.push(outcome);
            y_pred.push(predictor.predict(&entity.dense())?);
        }
    }
    if y_true.is_empty() {
        return Ok(None);
    }
    FitMetrics::compute(&y_true, &y_pred).map(Some)
}
