use rankx_core::{Entity, EntityId, EntityStore, Error, FeatureSchema, LinearModel, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct DatasetFile {
    entities: Vec<EntityRecord>,
}

#[derive(Debug, Deserialize)]
struct EntityRecord {
    id: EntityId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    outcome: Option<f64>,
    #[serde(default)]
    features: HashMap<String, Option<f64>>,
    /// Any other column, passed through untouched
    #[serde(flatten)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

/// Entities plus the model they are explained with
#[derive(Debug)]
pub struct Dataset {
    pub store: EntityStore,
    pub model: LinearModel,
}

/// Load a linear model from a JSON file and validate it
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LinearModel> {
    let data = std::fs::read_to_string(path.as_ref())?;
    parse_model(&data)
}

pub fn parse_model(data: &str) -> Result<LinearModel> {
    let mut model: LinearModel =
        serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))?;
    model.validate()?;
    Ok(model)
}

/// Load entity records, laying out their features in schema order.
///
/// Features a record does not mention, or gives as `null`, are missing.
/// Feature keys outside the schema are ignored.
pub fn load_entities<P: AsRef<Path>>(path: P, schema: &FeatureSchema) -> Result<Vec<Entity>> {
    let data = std::fs::read_to_string(path.as_ref())?;
    parse_entities(&data, schema)
}

pub fn parse_entities(data: &str, schema: &FeatureSchema) -> Result<Vec<Entity>> {
    let file: DatasetFile =
        serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))?;

    let mut unknown: BTreeSet<String> = BTreeSet::new();
    let entities = file
        .entities
        .into_iter()
        .map(|record| {
            let mut features = vec![None; schema.len()];
            for (name, value) in record.features {
                match schema.position(&name) {
                    Some(i) => features[i] = value,
                    None => {
                        unknown.insert(name);
                    }
                }
            }
            Entity {
                id: record.id,
                name: record.name,
                outcome: record.outcome,
                features,
                attributes: record.attributes,
            }
        })
        .collect();

    if !unknown.is_empty() {
        tracing::warn!(
            "Ignoring {} feature column(s) not used by the model: {:?}",
            unknown.len(),
            unknown
        );
    }
    Ok(entities)
}

/// Load the model, take its feature list as the schema, then load entities
pub fn load_dataset<P: AsRef<Path>, Q: AsRef<Path>>(dataset: P, model: Q) -> Result<Dataset> {
    let model_path = model.as_ref();
    let model = load_model(model_path)?;
    tracing::info!(
        "Model loaded from {:?}: {} features, version {}",
        model_path,
        model.features.len(),
        model.version
    );
    let schema = FeatureSchema::new(model.features.iter().cloned())?;
    let entities = load_entities(dataset.as_ref(), &schema)?;
    tracing::info!("Dataset loaded from {:?}", dataset.as_ref());
    let store = EntityStore::new(schema, entities)?;
    Ok(Dataset { store, model })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MODEL: &str = r#"{
        "version": "2024-01",
        "features": ["f1", "f2"],
        "intercept": 1.0,
        "coefficients": [0.5, -1.0]
    }"#;

    const DATASET: &str = r#"{
        "entities": [
            {"id": 26035553, "name": "Escola A", "outcome": 6.5,
             "features": {"f1": 10.0, "f2": null, "extra": 3.0}, "city": "Recife"},
            {"id": "B-2", "features": {"f2": 4.0}}
        ]
    }"#;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_model() {
        let model = parse_model(MODEL).unwrap();
        assert_eq!(model.version, "2024-01");
        assert_eq!(model.baseline, vec![0.0, 0.0]);
    }

    #[test]
    fn test_parse_model_rejects_mismatch() {
        let bad = r#"{"features": ["a"], "intercept": 0.0, "coefficients": [1.0, 2.0]}"#;
        assert!(matches!(parse_model(bad), Err(Error::Configuration(_))));
        assert!(matches!(parse_model("not json"), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_parse_entities() {
        let schema = FeatureSchema::new(["f1", "f2"]).unwrap();
        let entities = parse_entities(DATASET, &schema).unwrap();
        assert_eq!(entities.len(), 2);

        let a = &entities[0];
        assert_eq!(a.id, EntityId::Integer(26035553));
        assert_eq!(a.name.as_deref(), Some("Escola A"));
        assert_eq!(a.outcome, Some(6.5));
        assert_eq!(a.features, vec![Some(10.0), None]);
        assert_eq!(a.attributes.get("city").and_then(|v| v.as_str()), Some("Recife"));

        let b = &entities[1];
        assert_eq!(b.id, EntityId::from("B-2"));
        assert_eq!(b.features, vec![None, Some(4.0)]);
    }

    #[test]
    fn test_load_dataset_from_files() {
        let dataset = write_temp(DATASET);
        let model = write_temp(MODEL);
        let loaded = load_dataset(dataset.path(), model.path()).unwrap();
        assert_eq!(loaded.store.len(), 2);
        assert_eq!(loaded.store.schema().names(), &["f1".to_string(), "f2".to_string()]);
    }

    #[test]
    fn test_missing_file() {
        let schema = FeatureSchema::new(["f1"]).unwrap();
        assert!(matches!(
            load_entities("/nonexistent/rankx/dataset.json", &schema),
            Err(Error::Io(_))
        ));
    }
}
