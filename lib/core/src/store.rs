use crate::{Entity, EntityId, Error, FeatureSchema, Result};
use ahash::AHashMap;
use std::sync::Arc;

/// Immutable in-memory table of entities indexed by id.
///
/// Built once at startup and shared read-only afterwards. Row positions are
/// stable for the lifetime of the store and are used by the rank index and
/// the attribution cache to align their own per-entity data.
#[derive(Debug)]
pub struct EntityStore {
    schema: Arc<FeatureSchema>,
    entities: Vec<Entity>,
    positions: AHashMap<EntityId, usize>,
}

impl EntityStore {
    /// Create a store, validating every row against the schema
    pub fn new(schema: FeatureSchema, entities: Vec<Entity>) -> Result<Self> {
        if entities.is_empty() {
            return Err(Error::Configuration("entity store cannot be empty".to_string()));
        }

        let mut positions = AHashMap::with_capacity(entities.len());
        for (row, entity) in entities.iter().enumerate() {
            if entity.dim() != schema.len() {
                return Err(Error::Configuration(format!(
                    "entity {} has {} features, schema has {}",
                    entity.id,
                    entity.dim(),
                    schema.len()
                )));
            }
            if let Some(value) = entity.features.iter().flatten().find(|v| !v.is_finite()) {
                return Err(Error::Configuration(format!(
                    "entity {} has a non-finite feature value {}",
                    entity.id, value
                )));
            }
            if positions.insert(entity.id.clone(), row).is_some() {
                return Err(Error::Configuration(format!(
                    "duplicate entity id {}",
                    entity.id
                )));
            }
        }

        tracing::info!(
            "Entity store loaded: {} entities, {} features",
            entities.len(),
            schema.len()
        );

        Ok(Self {
            schema: Arc::new(schema),
            entities,
            positions,
        })
    }

    #[inline]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Shared handle to the schema for components that outlive a borrow
    #[inline]
    pub fn schema_arc(&self) -> Arc<FeatureSchema> {
        self.schema.clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Result<&Entity> {
        self.position(id)
            .map(|row| &self.entities[row])
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))
    }

    #[inline]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.positions.contains_key(id)
    }

    /// Row position of an entity
    #[inline]
    pub fn position(&self, id: &EntityId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Entity at a row position
    #[inline]
    pub fn at(&self, row: usize) -> Option<&Entity> {
        self.entities.get(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.iter().map(|e| &e.id)
    }

    /// Dense feature matrix in row order, missing values defaulted to 0.
    ///
    /// This is the exact input used for both prediction and explanation.
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.entities.iter().map(Entity::dense).collect()
    }
}
