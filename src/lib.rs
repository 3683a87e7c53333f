//! # RankX
//!
//! Explainability dashboard core for tabular models.
//!
//! RankX answers four questions about entities scored by a trained model:
//! which real entities are most alike, which features drive one entity's
//! prediction, what the prediction would be with some features changed,
//! and where an entity trails the top performers.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! rankx --dataset data/dataset.json --model data/model.json --http-port 5000
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use rankx::prelude::*;
//!
//! let schema = FeatureSchema::new(["teachers", "income"]).unwrap();
//! let store = EntityStore::new(schema, vec![
//!     Entity::from_values(1, &[10.0, 900.0]).with_outcome(5.0),
//!     Entity::from_values(2, &[20.0, 1200.0]).with_outcome(6.5),
//!     Entity::from_values(3, &[15.0, 700.0]).with_outcome(5.5),
//! ]).unwrap();
//! let model = LinearModel::new(
//!     vec!["teachers".into(), "income".into()],
//!     1.0,
//!     vec![0.1, 0.002],
//! );
//!
//! let context = DashboardContext::build(store, model, ContextConfig::default()).unwrap();
//! let dashboard = context.dashboard(&EntityId::from(1)).unwrap();
//! assert_eq!(dashboard.similar.len(), 2);
//! ```
//!
//! ## Crate Structure
//!
//! - [`rankx-core`](rankx_core) - Entities, feature schema, rank index, model traits, counterfactuals
//! - [`rankx-similarity`](rankx_similarity) - Percentile-rank nearest neighbour search
//! - [`rankx-attribution`](rankx_attribution) - Attribution cache, cohorts, gains and summary
//! - [`rankx-storage`](rankx_storage) - Dataset and model loading
//! - [`rankx-api`](rankx_api) - Dashboard context and REST API

// Re-export core types
pub use rankx_core::{
    CounterfactualEvaluator, Entity, EntityId, EntityStore, Error, Explainer, FeatureSchema,
    FitMetrics, LinearModel, Predictor, RankIndex, Result, Simulation,
};

// Re-export engines
pub use rankx_attribution::{
    AttributionCache, AttributionComparison, AttributionSummary, Cohort, FeatureAttribution,
    FeatureGain, SummaryOptions,
};
pub use rankx_similarity::{Neighbor, SimilarityEngine};

// Re-export storage
pub use rankx_storage::{load_dataset, Dataset};

// Re-export API
pub use rankx_api::{ContextConfig, DashboardContext, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AttributionCache, Cohort, ContextConfig, CounterfactualEvaluator, DashboardContext,
        Entity, EntityId, EntityStore, Error, Explainer, FeatureSchema, LinearModel, Neighbor,
        Predictor, RankIndex, Result, SimilarityEngine,
    };
}
