use crate::scheme::ProofScheme;

/// Proof layer errors.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(String),

    #[error("proof scheme not implemented: {0}")]
    NotImplemented(ProofScheme),

    #[error("no signing key for verification method: {0}")]
    KeyNotFound(String),

    #[error("proof creation failed: {0}")]
    ProofCreation(String),

    #[error("proof verification failed: {0}")]
    ProofVerification(String),

    #[error("invalid proof value: {0}")]
    InvalidProofValue(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
