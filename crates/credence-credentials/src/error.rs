use credence_identity::IdentityError;
use credence_proof::ProofError;

/// Credential layer errors.
///
/// Setup-level failures (bad input, unresolvable DIDs, duplicate ids) are
/// raised as `Err`; business-rule failures found during verification are
/// reported through `ValidationResult` entries instead, never as errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("DID resolution error: {0}")]
    DidResolution(#[from] IdentityError),

    #[error("schema validation error: {0}")]
    SchemaValidation(String),

    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("proof error: {0}")]
    Proof(#[from] ProofError),

    #[error("credential expired: {0}")]
    Expired(String),

    #[error("credential revoked: {0}")]
    Revoked(String),

    #[error("duplicate credential id: {0}")]
    DuplicateCredential(String),

    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    #[error("core error: {0}")]
    Core(#[from] credence_core::CoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CredentialError {
    /// Stable error code carried into batch item errors and audit records.
    pub fn code(&self) -> &'static str {
        match self {
            CredentialError::Validation(_) => "ValidationError",
            CredentialError::DidResolution(_) => "DidResolutionError",
            CredentialError::SchemaValidation(_)
            | CredentialError::SchemaNotFound(_)
            | CredentialError::InvalidSchema(_) => "SchemaValidationError",
            CredentialError::Proof(ProofError::UnsupportedProofType(_)) => "UnsupportedProofType",
            CredentialError::Proof(_) => "ProofCreationError",
            CredentialError::Expired(_) => "ExpiredCredential",
            CredentialError::Revoked(_) => "RevokedCredential",
            CredentialError::DuplicateCredential(_) => "DuplicateCredential",
            CredentialError::CredentialNotFound(_) => "CredentialNotFound",
            CredentialError::Core(_) => "ValidationError",
            CredentialError::Serialization(_) => "ValidationError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CredentialError::Validation("x".into()).code(),
            "ValidationError"
        );
        assert_eq!(
            CredentialError::Proof(ProofError::UnsupportedProofType("x".into())).code(),
            "UnsupportedProofType"
        );
        assert_eq!(
            CredentialError::Expired("x".into()).code(),
            "ExpiredCredential"
        );
    }
}
