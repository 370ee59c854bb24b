use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ProofError;
use crate::key_provider::KeyProvider;
use crate::model::{canonical_json, Proof, ProofPurpose};
use crate::scheme::ProofScheme;

/// Creates and verifies proofs for one scheme.
///
/// Signing and verification bytes go through the injected [`KeyProvider`];
/// the service itself only canonicalizes, encodes, and shapes the proof.
#[async_trait]
pub trait ProofService: Send + Sync {
    /// The scheme this service handles.
    fn scheme(&self) -> ProofScheme;

    /// Sign the canonicalized document and return the assembled proof.
    async fn create_proof(
        &self,
        document: &Value,
        verification_method: &str,
        purpose: ProofPurpose,
        created: Option<DateTime<Utc>>,
    ) -> Result<Proof, ProofError>;

    /// Verify a proof over the canonicalized document.
    async fn verify_proof(&self, document: &Value, proof: &Proof) -> Result<bool, ProofError>;

    /// Proof-level revocation hook for schemes that embed status material.
    /// The engine's credential status service is authoritative; schemes
    /// without embedded status report not-revoked here.
    async fn is_revoked(&self, _status_list: &str, _index: u64) -> Result<bool, ProofError> {
        Ok(false)
    }
}

impl std::fmt::Debug for dyn ProofService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProofService({})", self.scheme())
    }
}

async fn sign_document(
    key_provider: &dyn KeyProvider,
    scheme: ProofScheme,
    document: &Value,
    verification_method: &str,
    purpose: ProofPurpose,
    created: Option<DateTime<Utc>>,
) -> Result<Proof, ProofError> {
    let payload = canonical_json(document)?;
    let signature = key_provider.sign(&payload, verification_method).await?;
    debug!(scheme = %scheme, %verification_method, "proof created");
    Ok(Proof {
        proof_type: scheme,
        created: created.unwrap_or_else(Utc::now),
        verification_method: verification_method.to_string(),
        proof_purpose: purpose,
        proof_value: BASE64.encode(signature),
        challenge: None,
        domain: None,
    })
}

async fn verify_document(
    key_provider: &dyn KeyProvider,
    scheme: ProofScheme,
    document: &Value,
    proof: &Proof,
) -> Result<bool, ProofError> {
    if proof.proof_type != scheme {
        return Err(ProofError::ProofVerification(format!(
            "proof type {} handled by {} service",
            proof.proof_type, scheme
        )));
    }
    let payload = canonical_json(document)?;
    let signature = BASE64
        .decode(&proof.proof_value)
        .map_err(|e| ProofError::InvalidProofValue(e.to_string()))?;
    let valid = key_provider
        .verify(&payload, &signature, &proof.verification_method)
        .await?;
    if !valid {
        warn!(scheme = %scheme, verification_method = %proof.verification_method,
            "signature mismatch");
    }
    Ok(valid)
}

/// Ed25519Signature2020 proofs.
pub struct Ed25519ProofService {
    key_provider: Arc<dyn KeyProvider>,
}

impl Ed25519ProofService {
    pub fn new(key_provider: Arc<dyn KeyProvider>) -> Self {
        Self { key_provider }
    }
}

#[async_trait]
impl ProofService for Ed25519ProofService {
    fn scheme(&self) -> ProofScheme {
        ProofScheme::Ed25519Signature2020
    }

    async fn create_proof(
        &self,
        document: &Value,
        verification_method: &str,
        purpose: ProofPurpose,
        created: Option<DateTime<Utc>>,
    ) -> Result<Proof, ProofError> {
        sign_document(
            self.key_provider.as_ref(),
            self.scheme(),
            document,
            verification_method,
            purpose,
            created,
        )
        .await
    }

    async fn verify_proof(&self, document: &Value, proof: &Proof) -> Result<bool, ProofError> {
        verify_document(self.key_provider.as_ref(), self.scheme(), document, proof).await
    }
}

/// RsaSignature2018 proofs. The key provider carries the RSA primitives;
/// the proof shape and canonicalization are identical to Ed25519.
pub struct RsaProofService {
    key_provider: Arc<dyn KeyProvider>,
}

impl RsaProofService {
    pub fn new(key_provider: Arc<dyn KeyProvider>) -> Self {
        Self { key_provider }
    }
}

#[async_trait]
impl ProofService for RsaProofService {
    fn scheme(&self) -> ProofScheme {
        ProofScheme::RsaSignature2018
    }

    async fn create_proof(
        &self,
        document: &Value,
        verification_method: &str,
        purpose: ProofPurpose,
        created: Option<DateTime<Utc>>,
    ) -> Result<Proof, ProofError> {
        sign_document(
            self.key_provider.as_ref(),
            self.scheme(),
            document,
            verification_method,
            purpose,
            created,
        )
        .await
    }

    async fn verify_proof(&self, document: &Value, proof: &Proof) -> Result<bool, ProofError> {
        verify_document(self.key_provider.as_ref(), self.scheme(), document, proof).await
    }
}

/// Placeholder for schemes the factory recognizes but the engine does not
/// yet implement (ECDSA secp256k1, BBS+, generic JWS). Every operation
/// reports a typed `NotImplemented` error, never a false success.
pub struct UnimplementedProofService {
    scheme: ProofScheme,
}

impl UnimplementedProofService {
    pub fn new(scheme: ProofScheme) -> Self {
        Self { scheme }
    }
}

#[async_trait]
impl ProofService for UnimplementedProofService {
    fn scheme(&self) -> ProofScheme {
        self.scheme
    }

    async fn create_proof(
        &self,
        _document: &Value,
        _verification_method: &str,
        _purpose: ProofPurpose,
        _created: Option<DateTime<Utc>>,
    ) -> Result<Proof, ProofError> {
        Err(ProofError::NotImplemented(self.scheme))
    }

    async fn verify_proof(&self, _document: &Value, _proof: &Proof) -> Result<bool, ProofError> {
        Err(ProofError::NotImplemented(self.scheme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_provider::InMemoryKeyProvider;
    use serde_json::json;

    fn ed25519_setup() -> (Ed25519ProofService, String) {
        let provider = Arc::new(InMemoryKeyProvider::new());
        let handle = provider.generate("did:example:issuer1");
        (Ed25519ProofService::new(provider), handle.verification_method)
    }

    #[tokio::test]
    async fn test_create_and_verify() {
        let (service, vm) = ed25519_setup();
        let doc = json!({"id": "urn:uuid:1", "claim": "BSc"});

        let proof = service
            .create_proof(&doc, &vm, ProofPurpose::AssertionMethod, None)
            .await
            .unwrap();
        assert_eq!(proof.proof_type, ProofScheme::Ed25519Signature2020);
        assert_eq!(proof.proof_purpose, ProofPurpose::AssertionMethod);
        assert!(service.verify_proof(&doc, &proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_tampered_document_fails() {
        let (service, vm) = ed25519_setup();
        let doc = json!({"claim": "BSc"});
        let proof = service
            .create_proof(&doc, &vm, ProofPurpose::AssertionMethod, None)
            .await
            .unwrap();

        let tampered = json!({"claim": "PhD"});
        assert!(!service.verify_proof(&tampered, &proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_field_order_does_not_matter() {
        let (service, vm) = ed25519_setup();
        let doc = json!({"a": 1, "b": 2});
        let proof = service
            .create_proof(&doc, &vm, ProofPurpose::AssertionMethod, None)
            .await
            .unwrap();

        let reordered = json!({"b": 2, "a": 1});
        assert!(service.verify_proof(&reordered, &proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_scheme_mismatch_rejected() {
        let (service, vm) = ed25519_setup();
        let doc = json!({"claim": "BSc"});
        let mut proof = service
            .create_proof(&doc, &vm, ProofPurpose::AssertionMethod, None)
            .await
            .unwrap();
        proof.proof_type = ProofScheme::RsaSignature2018;

        let err = service.verify_proof(&doc, &proof).await.unwrap_err();
        assert!(matches!(err, ProofError::ProofVerification(_)));
    }

    #[tokio::test]
    async fn test_unimplemented_schemes_report_typed_error() {
        for scheme in [
            ProofScheme::EcdsaSecp256k1Signature2019,
            ProofScheme::BbsBlsSignature2020,
            ProofScheme::JsonWebSignature2020,
        ] {
            let service = UnimplementedProofService::new(scheme);
            let err = service
                .create_proof(&json!({}), "did:example:a#keys-1", ProofPurpose::AssertionMethod, None)
                .await
                .unwrap_err();
            assert!(matches!(err, ProofError::NotImplemented(s) if s == scheme));
        }
    }

    #[tokio::test]
    async fn test_default_revocation_hook() {
        let (service, _) = ed25519_setup();
        assert!(!service.is_revoked("https://example.com/status/1", 42).await.unwrap());
    }
}
