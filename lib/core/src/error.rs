use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// True for errors caused by the caller's input rather than by the
    /// dataset or the model.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::EntityNotFound(_) | Error::Validation(_))
    }
}
