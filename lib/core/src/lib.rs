//! # RankX Core
//!
//! Core library for the RankX explainability engine.
//!
//! This crate provides the fundamental data structures:
//!
//! - [`FeatureSchema`] - Fixed, ordered feature names shared by model and data
//! - [`Entity`] / [`EntityStore`] - Immutable table of entities keyed by [`EntityId`]
//! - [`RankIndex`] - Per-feature sorted values for percentile-rank lookup
//! - [`Predictor`] / [`Explainer`] - Model collaborators, with [`LinearModel`] as reference
//! - [`CounterfactualEvaluator`] - Predictions for entities with overridden features
//!
//! ## Example
//!
//! ```rust
//! use rankx_core::{Entity, EntityStore, FeatureSchema, RankIndex};
//!
//! let schema = FeatureSchema::new(["f1", "f2"]).unwrap();
//! let store = EntityStore::new(schema, vec![
//!     Entity::from_values("A", &[10.0, 5.0]),
//!     Entity::from_values("B", &[20.0, 5.0]),
//!     Entity::from_values("C", &[15.0, 50.0]),
//! ]).unwrap();
//!
//! let index = RankIndex::build(&store).unwrap();
//! assert_eq!(index.percentile_rank(0, 20.0), 2);
//! ```

pub mod error;
pub mod entity;
pub mod schema;
pub mod store;
pub mod rank;
pub mod model;
pub mod counterfactual;
pub mod metrics;

pub use error::{Error, Result};
pub use entity::{Entity, EntityId};
pub use schema::FeatureSchema;
pub use store::EntityStore;
pub use rank::RankIndex;
pub use model::{Explainer, LinearModel, Predictor};
pub use counterfactual::{CounterfactualEvaluator, Simulation};
pub use metrics::FitMetrics;
