//! Request and response bodies of the dashboard API

use rankx_attribution::{FeatureAttribution, FeatureGain};
use rankx_core::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntitySummary {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureValue {
    pub feature: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityDetails {
    pub id: EntityId,
    pub name: Option<String>,
    pub outcome: Option<f64>,
    pub features: Vec<FeatureValue>,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// A real entity close to a query vector
#[derive(Debug, Clone, Serialize)]
pub struct SimilarEntity {
    pub id: EntityId,
    pub name: Option<String>,
    pub outcome: Option<f64>,
    /// Percentile distance in percent, `[0, 100]`
    pub distance: f64,
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityDashboard {
    pub entity: EntityDetails,
    /// Sorted ascending by attribution
    pub attributions: Vec<FeatureAttribution>,
    pub similar: Vec<SimilarEntity>,
    pub prediction: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CounterfactualRequest {
    pub entity_id: EntityId,
    #[serde(default)]
    pub features: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarRequest {
    pub features: HashMap<String, f64>,
    /// Restrict the comparison to these features; absent or empty means all
    #[serde(default)]
    pub context_features: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GainReport {
    pub entity_id: EntityId,
    pub cohort: String,
    pub cohort_size: usize,
    pub gains: Vec<FeatureGain>,
}
