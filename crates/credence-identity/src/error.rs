/// Identity layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("DID not found: {0}")]
    DidNotFound(String),

    #[error("DID resolution failed: {0}")]
    DidResolution(String),

    #[error("invalid DID document: {0}")]
    InvalidDocument(String),

    #[error("core error: {0}")]
    Core(#[from] credence_core::CoreError),
}
