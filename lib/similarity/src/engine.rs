//! Nearest-neighbour search over real entities
//!
//! Compares any feature vector, real or hypothetical, against every candidate
//! entity with the percentile-rank distance and keeps the `k` closest.
//! Candidate ranks are resolved once at construction; a query only needs one
//! binary search per feature for its own values.

use crate::distance::{normalize_gap, percentile_distance, total_rank_gap};
use ahash::AHashSet;
use rankx_core::{EntityId, EntityStore, Error, RankIndex, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// A similar entity and its distance in percent, `[0, 100]`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Neighbor {
    pub id: EntityId,
    pub distance: f64,
}

/// Heap entry ordered by (rank gap, id); the heap top is the worst kept result
struct Candidate<'a> {
    gap: u64,
    id: &'a EntityId,
}

impl PartialEq for Candidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.gap == other.gap && self.id == other.id
    }
}

impl Eq for Candidate<'_> {}

impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gap.cmp(&other.gap).then_with(|| self.id.cmp(other.id))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Percentile-rank similarity engine
///
/// Entities listed in the exclusion set at construction are removed for good:
/// they are neither part of the rank index nor returned as results.
pub struct SimilarityEngine {
    store: Arc<EntityStore>,
    index: RankIndex,
    /// Store rows that may be returned as results
    candidates: Vec<usize>,
    /// Row-major `candidates.len() x features` precomputed ranks
    ranks: Vec<u32>,
    excluded: AHashSet<EntityId>,
}

impl SimilarityEngine {
    pub fn new(store: Arc<EntityStore>, excluded: &[EntityId]) -> Result<Self> {
        let excluded: AHashSet<EntityId> = excluded.iter().cloned().collect();
        for id in &excluded {
            if !store.contains(id) {
                tracing::warn!("excluded entity {} is not in the store", id);
            }
        }

        let candidates: Vec<usize> = (0..store.len())
            .filter(|&row| {
                store
                    .at(row)
                    .map(|e| !excluded.contains(&e.id))
                    .unwrap_or(false)
            })
            .collect();

        let index = RankIndex::from_entities(
            store.schema(),
            candidates.iter().filter_map(|&row| store.at(row)),
        )
        .map_err(|e| match e {
            Error::Configuration(_) => Error::Configuration(
                "no similarity candidates left after exclusions".to_string(),
            ),
            other => other,
        })?;

        let features = store.schema().len();
        let mut ranks = Vec::with_capacity(candidates.len() * features);
        for &row in &candidates {
            if let Some(entity) = store.at(row) {
                for (feature, value) in entity.features.iter().enumerate() {
                    ranks.push(index.percentile_rank(feature, value.unwrap_or(0.0)) as u32);
                }
            }
        }

        tracing::info!(
            "Similarity engine ready: {} candidates, {} excluded",
            candidates.len(),
            store.len() - candidates.len()
        );

        Ok(Self {
            store,
            index,
            candidates,
            ranks,
            excluded,
        })
    }

    #[inline]
    pub fn index(&self) -> &RankIndex {
        &self.index
    }

    #[inline]
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    pub fn is_excluded(&self, id: &EntityId) -> bool {
        self.excluded.contains(id)
    }

    /// Mean percentile gap between two dense vectors, in `[0, 1]`
    pub fn distance(&self, a: &[f64], b: &[f64], features: &[usize]) -> f64 {
        percentile_distance(&self.index, a, b, features)
    }

    /// The `k` candidates closest to `query`.
    ///
    /// `query` is a dense schema-ordered vector. `features` restricts the
    /// comparison to a subset; `None` or an empty subset compares every
    /// feature. Entities in `exclude` are skipped for this query only.
    /// Results are sorted by distance, ties by ascending id.
    pub fn find_nearest(
        &self,
        query: &[f64],
        k: usize,
        features: Option<&[usize]>,
        exclude: &[EntityId],
    ) -> Result<Vec<Neighbor>> {
        let dim = self.store.schema().len();
        if query.len() != dim {
            return Err(Error::Validation(format!(
                "query vector has {} values, schema has {}",
                query.len(),
                dim
            )));
        }
        if let Some(value) = query.iter().find(|v| !v.is_finite()) {
            return Err(Error::Validation(format!(
                "query vector contains non-finite value {}",
                value
            )));
        }

        let features: Vec<usize> = match features {
            Some(subset) if !subset.is_empty() => {
                subset.iter().copied().filter(|&f| f < dim).collect()
            }
            _ => (0..dim).collect(),
        };
        if features.is_empty() {
            return Err(Error::Validation(
                "feature subset references no schema feature".to_string(),
            ));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_ranks: Vec<(usize, u32)> = features
            .iter()
            .map(|&f| (f, self.index.percentile_rank(f, query[f]) as u32))
            .collect();

        let gaps: Vec<u64> = (0..self.candidates.len())
            .into_par_iter()
            .map(|slot| {
                let row = &self.ranks[slot * dim..(slot + 1) * dim];
                query_ranks
                    .iter()
                    .map(|&(f, q)| q.abs_diff(row[f]) as u64)
                    .sum()
            })
            .collect();

        let mut heap: BinaryHeap<Candidate<'_>> =
            BinaryHeap::with_capacity(k.min(self.candidates.len()) + 1);
        for (&row, &gap) in self.candidates.iter().zip(&gaps) {
            let Some(entity) = self.store.at(row) else {
                continue;
            };
            if exclude.contains(&entity.id) {
                continue;
            }
            let candidate = Candidate { gap, id: &entity.id };
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().map(|worst| candidate < *worst).unwrap_or(false) {
                heap.pop();
                heap.push(candidate);
            }
        }

        let n = self.index.len();
        let used = features.len();
        let results: Vec<Neighbor> = heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                id: c.id.clone(),
                distance: normalize_gap(c.gap, used, n) * 100.0,
            })
            .collect();

        tracing::debug!(
            "find_nearest: k={}, features={}, returned {}",
            k,
            used,
            results.len()
        );
        Ok(results)
    }

    /// Nearest neighbours of a hypothetical vector given by feature name.
    ///
    /// Unknown names in either argument are ignored; absent features are 0.
    pub fn find_nearest_named<I, K, S>(
        &self,
        query: I,
        k: usize,
        context: &[S],
    ) -> Result<Vec<Neighbor>>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
        S: AsRef<str>,
    {
        let schema = self.store.schema();
        let dense = schema.dense_from_pairs(query)?;
        let features = schema.resolve_subset(context)?;
        self.find_nearest(&dense, k, Some(&features), &[])
    }

    /// Nearest real entities to an entity in the store, excluding itself
    pub fn neighbors_of(&self, id: &EntityId, k: usize) -> Result<Vec<Neighbor>> {
        let entity = self.store.get(id)?;
        self.find_nearest(&entity.dense(), k, None, std::slice::from_ref(id))
    }

    /// Distance between two stored entities over every feature, in `[0, 1]`
    pub fn entity_distance(&self, a: &EntityId, b: &EntityId) -> Result<f64> {
        let a = self.store.get(a)?.dense();
        let b = self.store.get(b)?.dense();
        let features = self.store.schema().all_indices();
        let (total, used) = total_rank_gap(&self.index, &a, &b, &features);
        Ok(normalize_gap(total, used, self.index.len()))
    }
}
