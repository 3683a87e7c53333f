//! Counterfactual evaluation
//!
//! Re-runs the predictor on a copy of a real entity's feature vector with
//! some values overridden. Nothing is cached: overrides are request specific.

use crate::{EntityId, EntityStore, Error, Predictor, Result};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of a counterfactual simulation
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Simulation {
    /// Prediction for the unmodified entity
    pub baseline: f64,
    /// Prediction with overrides applied
    pub simulated: f64,
    pub delta: f64,
}

/// Applies sparse feature overrides to real entities and predicts
#[derive(Clone)]
pub struct CounterfactualEvaluator {
    store: Arc<EntityStore>,
    predictor: Arc<dyn Predictor>,
}

impl CounterfactualEvaluator {
    pub fn new(store: Arc<EntityStore>, predictor: Arc<dyn Predictor>) -> Self {
        Self { store, predictor }
    }

    /// Prediction for an entity's own feature vector
    pub fn predict_entity(&self, id: &EntityId) -> Result<f64> {
        let entity = self.store.get(id)?;
        self.predictor.predict(&entity.dense())
    }

    /// Predict with `(feature index, value)` overrides applied.
    ///
    /// Indices outside the schema are ignored.
    pub fn simulate(&self, id: &EntityId, overrides: &[(usize, f64)]) -> Result<f64> {
        let entity = self.store.get(id)?;
        let mut vector = entity.dense();
        for &(feature, value) in overrides {
            match vector.get_mut(feature) {
                Some(slot) => *slot = value,
                None => tracing::debug!("ignoring override for feature index {}", feature),
            }
        }
        self.predictor.predict(&vector)
    }

    /// Predict with name-keyed overrides.
    ///
    /// Unknown names are ignored; non-finite values are a validation error.
    pub fn simulate_named<I, K>(&self, id: &EntityId, overrides: I) -> Result<Simulation>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        if !self.store.contains(id) {
            return Err(Error::EntityNotFound(id.to_string()));
        }
        let overrides = self.store.schema().overrides_from_pairs(overrides)?;
        let baseline = self.predict_entity(id)?;
        let simulated = self.simulate(id, &overrides)?;

        tracing::debug!(
            "Counterfactual for {}: {} overrides, {:.4} -> {:.4}",
            id,
            overrides.len(),
            baseline,
            simulated
        );

        Ok(Simulation {
            baseline,
            simulated,
            delta: simulated - baseline,
        })
    }
}
