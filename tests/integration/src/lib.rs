//! Shared fixture wiring the whole engine together the way a deployment
//! would: one resolver, one key provider, one proof factory, and the
//! issuance, validation, and presentation services on top.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use credence_core::EngineConfig;
use credence_credentials::{
    CredentialIssuanceService, CredentialValidator, InMemoryAuditSink,
    InMemoryCredentialRepository, InMemoryStatusService, IssueRequest, SchemaRegistry,
};
use credence_identity::{DidDocument, InMemoryDidResolver};
use credence_presentation::{PresentationService, PresentationValidator};
use credence_proof::{InMemoryKeyProvider, ProofServiceFactory};

pub struct TestEngine {
    pub resolver: Arc<InMemoryDidResolver>,
    pub key_provider: Arc<InMemoryKeyProvider>,
    pub proof_factory: Arc<ProofServiceFactory>,
    pub status_service: Arc<InMemoryStatusService>,
    pub audit: Arc<InMemoryAuditSink>,
    pub validator: Arc<CredentialValidator>,
    pub issuance: CredentialIssuanceService,
    pub presentations: PresentationService,
    pub presentation_validator: PresentationValidator,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let resolver = Arc::new(InMemoryDidResolver::new());
        let key_provider = Arc::new(InMemoryKeyProvider::new());
        let proof_factory = Arc::new(ProofServiceFactory::new(key_provider.clone()));
        let repository = Arc::new(InMemoryCredentialRepository::new());
        let schema_registry = Arc::new(SchemaRegistry::new());
        let status_service = Arc::new(InMemoryStatusService::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let validator = Arc::new(CredentialValidator::new(
            resolver.clone(),
            key_provider.clone(),
            proof_factory.clone(),
            status_service.clone(),
        ));
        let issuance = CredentialIssuanceService::new(
            resolver.clone(),
            proof_factory.clone(),
            repository,
            schema_registry,
            status_service.clone(),
            validator.clone(),
            audit.clone(),
            config,
        );
        let presentations = PresentationService::new(
            resolver.clone(),
            proof_factory.clone(),
            validator.clone(),
        );
        let presentation_validator = PresentationValidator::new(
            resolver.clone(),
            proof_factory.clone(),
            status_service.clone(),
        );
        Self {
            resolver,
            key_provider,
            proof_factory,
            status_service,
            audit,
            validator,
            issuance,
            presentations,
            presentation_validator,
        }
    }

    /// Generate a keypair for a DID and publish its document.
    pub fn register_participant(&self, did: &str) {
        let handle = self.key_provider.generate(did);
        let multibase = self
            .key_provider
            .public_key_multibase(&handle.verification_method);
        self.resolver.register(DidDocument::new(did, multibase));
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A diploma issuance request with one claim.
pub fn diploma_request(issuer: &str, subject: &str) -> IssueRequest {
    let mut claims = Map::new();
    claims.insert("degree".into(), json!("BSc"));
    claims.insert("institution".into(), json!("Example University"));
    IssueRequest::new(issuer, subject, "DiplomaCredential", claims)
}

pub fn claims(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
