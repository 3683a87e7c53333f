use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unique identifier of an entity.
///
/// Integer ids order before string ids; within a variant the natural
/// ordering applies. This ordering is the tie-breaker for similarity results.
///
/// Deserializes from a JSON integer or string; strings go through
/// [`FromStr`], so `"42"` and `42` name the same entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum EntityId {
    Integer(u64),
    String(String),
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Integer(i) => write!(f, "{}", i),
            EntityId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for EntityId {
    fn from(i: u64) -> Self {
        EntityId::Integer(i)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::String(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::String(s.to_string())
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    /// Numeric strings become integer ids, anything else a string id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<u64>() {
            Ok(i) => EntityId::Integer(i),
            Err(_) => EntityId::String(s.to_string()),
        })
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = EntityId;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a non-negative integer or a string entity id")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
                Ok(EntityId::Integer(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
                u64::try_from(v)
                    .map(EntityId::Integer)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
                v.parse().map_err(|never: std::convert::Infallible| match never {})
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// One real-world item described by a schema-ordered feature vector.
///
/// `features[i]` is `None` when the value is missing from the source data.
/// Missing values are kept as-is here and only defaulted to zero when a
/// dense vector is requested for ranking, prediction or explanation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Recorded outcome (the quantity the model predicts), if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<f64>,
    pub features: Vec<Option<f64>>,
    /// Descriptive columns passed through untouched
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<EntityId>, features: Vec<Option<f64>>) -> Self {
        Self {
            id: id.into(),
            name: None,
            outcome: None,
            features,
            attributes: serde_json::Map::new(),
        }
    }

    /// Build an entity without missing values
    #[inline]
    #[must_use]
    pub fn from_values(id: impl Into<EntityId>, values: &[f64]) -> Self {
        Self::new(id, values.iter().copied().map(Some).collect())
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_outcome(mut self, outcome: f64) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Feature vector with missing values defaulted to 0.
    pub fn dense(&self) -> Vec<f64> {
        self.features.iter().map(|v| v.unwrap_or(0.0)).collect()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.features.len()
    }
}
