//! # RankX Attribution
//!
//! Precomputed per-entity attribution vectors for explainability dashboards.
//!
//! ## Overview
//!
//! Model explanation algorithms are expensive per invocation but support
//! batched computation. The [`AttributionCache`] runs the explainer once over
//! the whole feature matrix at startup; every dashboard read afterwards is a
//! lookup or a cheap aggregation.
//!
//! **What it answers:**
//! - Why did the model predict this for entity X? ([`AttributionCache::get`])
//! - Which features matter most for X? ([`AttributionCache::top_by_magnitude`])
//! - How do X and Y differ? ([`AttributionCache::compare`])
//! - Where does X trail the best performers? ([`AttributionCache::gain`])
//! - Which features matter across the dataset? ([`AttributionSummary`])
//!
//! Gains are a diagnostic ranking, not a causal guarantee.
//!
//! ## Example
//!
//! ```rust
//! use rankx_attribution::{AttributionCache, Cohort};
//! use rankx_core::{Entity, EntityId, EntityStore, FeatureSchema, LinearModel};
//!
//! let schema = FeatureSchema::new(["f1", "f2"]).unwrap();
//! let store = EntityStore::new(schema, vec![
//!     Entity::from_values(1, &[1.0, 2.0]).with_outcome(5.0),
//!     Entity::from_values(2, &[3.0, 1.0]).with_outcome(9.0),
//! ]).unwrap();
//! let model = LinearModel::new(vec!["f1".into(), "f2".into()], 0.0, vec![2.0, 1.0]);
//!
//! let cache = AttributionCache::build(&store, &model).unwrap();
//! let cohort = Cohort::top_quantile(&store, 0.9).unwrap();
//! let gains = cache.gain(&EntityId::from(1), cohort.members(), 10).unwrap();
//! assert_eq!(gains[0].feature, "f1");
//! ```

pub mod cache;
pub mod cohort;
pub mod explain;

pub use cache::AttributionCache;
pub use cohort::{quantile, Cohort};
pub use explain::{
    AttributionComparison,
    AttributionSummary,
    FeatureAttribution,
    FeatureGain,
    FeatureImportance,
    SummaryOptions,
    SummaryPoint,
};
