/// Core errors shared across the engine.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}
