//! # RankX Similarity
//!
//! Percentile-rank similarity between tabular entities.
//!
//! Features with heterogeneous units cannot be compared with raw Euclidean
//! or Manhattan distance. This crate maps every value to its percentile rank
//! in the dataset and averages the absolute percentile gaps, which makes the
//! metric scale-invariant and insensitive to outliers.
//!
//! ## Features
//!
//! - **Percentile distance**: mean absolute percentile gap over any feature subset
//! - **Hypothetical queries**: search with vectors that match no real entity
//! - **Contextual similarity**: restrict the comparison to a subset of features
//! - **Deterministic results**: ties broken by ascending entity id
//!
//! ## Example
//!
//! ```rust
//! use rankx_core::{Entity, EntityId, EntityStore, FeatureSchema};
//! use rankx_similarity::SimilarityEngine;
//! use std::sync::Arc;
//!
//! let schema = FeatureSchema::new(["f1", "f2"]).unwrap();
//! let store = Arc::new(EntityStore::new(schema, vec![
//!     Entity::from_values("A", &[10.0, 5.0]),
//!     Entity::from_values("B", &[20.0, 5.0]),
//!     Entity::from_values("C", &[15.0, 50.0]),
//! ]).unwrap());
//!
//! let engine = SimilarityEngine::new(store, &[]).unwrap();
//! let nearest = engine.find_nearest(&[10.0, 5.0], 1, None, &[]).unwrap();
//! assert_eq!(nearest[0].id, EntityId::from("A"));
//! assert_eq!(nearest[0].distance, 0.0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ EntityStore │────>│  RankIndex  │────>│  Candidate  │
//! │   (rows)    │     │  (sorted)   │     │    ranks    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                     ┌─────────────┐            │
//!    query vector ───>│ query ranks │──> gaps <──┘
//!                     └─────────────┘     │
//!                                   ┌─────────────┐
//!                                   │   top-k     │
//!                                   │ (gap, id)   │
//!                                   └─────────────┘
//! ```

pub mod distance;
pub mod engine;

pub use distance::{percentile_distance, rank_gap};
pub use engine::{Neighbor, SimilarityEngine};
