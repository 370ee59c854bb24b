use serde::{Deserialize, Serialize};

/// Configuration for the credential trust engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// DIDs of trusted credential issuers. An empty list disables the
    /// trust-anchor check; a non-empty list makes absence a warning.
    pub trusted_issuers: Vec<String>,
    /// Proof scheme used when an issuance request does not name one.
    pub default_proof_scheme: String,
    /// Whether issuance validates claims against a referenced schema.
    pub validate_schemas: bool,
    /// Whether verification consults the credential status service.
    pub check_revocation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trusted_issuers: Vec::new(),
            default_proof_scheme: "Ed25519Signature2020".into(),
            validate_schemas: true,
            check_revocation: true,
        }
    }
}
