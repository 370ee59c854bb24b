use std::sync::Arc;

use crate::error::ProofError;
use crate::key_provider::KeyProvider;
use crate::scheme::ProofScheme;
use crate::service::{
    Ed25519ProofService, ProofService, RsaProofService, UnimplementedProofService,
};

/// Maps a declared proof scheme to its concrete service.
///
/// Unknown scheme identifiers fail fast with [`ProofError::UnsupportedProofType`]
/// instead of silently degrading to a default service.
pub struct ProofServiceFactory {
    key_provider: Arc<dyn KeyProvider>,
}

impl ProofServiceFactory {
    pub fn new(key_provider: Arc<dyn KeyProvider>) -> Self {
        Self { key_provider }
    }

    /// The service handling a known scheme.
    pub fn service_for(&self, scheme: ProofScheme) -> Arc<dyn ProofService> {
        match scheme {
            ProofScheme::Ed25519Signature2020 => {
                Arc::new(Ed25519ProofService::new(self.key_provider.clone()))
            }
            ProofScheme::RsaSignature2018 => {
                Arc::new(RsaProofService::new(self.key_provider.clone()))
            }
            other => Arc::new(UnimplementedProofService::new(other)),
        }
    }

    /// Resolve a service from a declared scheme identifier string.
    pub fn service_for_type(&self, proof_type: &str) -> Result<Arc<dyn ProofService>, ProofError> {
        let scheme: ProofScheme = proof_type.parse()?;
        Ok(self.service_for(scheme))
    }
}
