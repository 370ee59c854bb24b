use credence_credentials::CredentialError;
use credence_identity::IdentityError;
use credence_proof::ProofError;

/// Presentation layer errors.
#[derive(Debug, thiserror::Error)]
pub enum PresentationError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("DID resolution error: {0}")]
    DidResolution(#[from] IdentityError),

    #[error("proof error: {0}")]
    Proof(#[from] ProofError),

    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("challenge expired at {0}")]
    ChallengeExpired(String),

    #[error("domain mismatch: {0}")]
    DomainMismatch(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
