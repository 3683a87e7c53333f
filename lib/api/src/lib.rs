//! # RankX API
//!
//! The dashboard context and its REST surface.
//!
//! [`DashboardContext`] owns everything built at startup and answers every
//! request read-only. [`RestApi`] exposes it over HTTP with JSON bodies;
//! errors come back as `{"error": "..."}` with 404 for unknown entities and
//! 400 for invalid input.

pub mod context;
pub mod payload;
pub mod rest;

pub use context::{ContextConfig, DashboardContext};
pub use payload::{
    CounterfactualRequest, EntityDashboard, EntityDetails, EntitySummary, FeatureValue,
    GainReport, SimilarEntity, SimilarRequest,
};
pub use rest::{routes, RestApi};
