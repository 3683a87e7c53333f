pub mod dataset;

pub use dataset::{load_dataset, load_entities, load_model, parse_entities, parse_model, Dataset};
