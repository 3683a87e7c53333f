//! Reference cohorts
//!
//! A cohort is a named subset of entities used as the aggregation reference
//! for gain rankings, by default the top decile by recorded outcome.

use rankx_core::{EntityId, EntityStore, Error, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Cohort {
    pub name: String,
    /// Outcome cutoff used to select members, if selected by quantile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
    members: Vec<EntityId>,
}

impl Cohort {
    pub fn new(name: impl Into<String>, members: Vec<EntityId>) -> Self {
        Self {
            name: name.into(),
            cutoff: None,
            members,
        }
    }

    /// Entities whose outcome is at or above the `q`-quantile of outcomes.
    ///
    /// Entities without a recorded outcome are never members.
    pub fn top_quantile(store: &EntityStore, q: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&q) {
            return Err(Error::Configuration(format!(
                "quantile {} is outside [0, 1]",
                q
            )));
        }

        let mut outcomes: Vec<f64> = store.iter().filter_map(|e| e.outcome).collect();
        let Some(cutoff) = quantile(&mut outcomes, q) else {
            return Err(Error::Configuration(
                "no entity has a recorded outcome".to_string(),
            ));
        };

        let members: Vec<EntityId> = store
            .iter()
            .filter(|e| e.outcome.map(|o| o >= cutoff).unwrap_or(false))
            .map(|e| e.id.clone())
            .collect();

        tracing::info!(
            "Reference cohort: {} entities with outcome >= {:.4} (q={})",
            members.len(),
            cutoff,
            q
        );

        Ok(Self {
            name: format!("top {:.0}% by outcome", (1.0 - q) * 100.0),
            cutoff: Some(cutoff),
            members,
        })
    }

    #[inline]
    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Quantile with linear interpolation between closest ranks.
///
/// Sorts `values` in place. Returns `None` for an empty slice.
pub fn quantile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let position = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * fraction)
}
