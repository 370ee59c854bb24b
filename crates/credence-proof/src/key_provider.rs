use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dashmap::DashMap;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use rand::rngs::OsRng;
use tracing::debug;

use crate::error::ProofError;
use crate::scheme::ProofScheme;

/// An opaque reference to a signing key. Raw key material never crosses
/// this boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHandle {
    /// The verification method id the key signs under.
    pub verification_method: String,
    /// The DID that controls the key.
    pub controller: String,
    /// The scheme the key is usable with.
    pub scheme: ProofScheme,
}

/// Custody boundary for signing keys. Implementations sign and verify on
/// behalf of the engine; callers address keys by verification method id.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn sign(&self, data: &[u8], verification_method: &str) -> Result<Vec<u8>, ProofError>;

    async fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        verification_method: &str,
    ) -> Result<bool, ProofError>;

    /// Look up the key handle controlled by a DID, if one is held.
    async fn key_handle(&self, did: &str) -> Result<KeyHandle, ProofError>;
}

/// Ed25519 key provider backed by a concurrent in-memory keyring.
#[derive(Default)]
pub struct InMemoryKeyProvider {
    keys: DashMap<String, SigningKey>,
}

impl InMemoryKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh Ed25519 keypair for a DID and return its handle.
    /// The verification method id follows the `<did>#keys-1` convention.
    pub fn generate(&self, did: &str) -> KeyHandle {
        let verification_method = format!("{}#keys-1", did);
        let signing_key = SigningKey::generate(&mut OsRng);
        debug!(%verification_method, "generated signing key");
        self.keys.insert(verification_method.clone(), signing_key);
        KeyHandle {
            verification_method,
            controller: did.to_string(),
            scheme: ProofScheme::Ed25519Signature2020,
        }
    }

    /// Multibase-style encoding of the public half, for publication in a
    /// DID Document.
    pub fn public_key_multibase(&self, verification_method: &str) -> Option<String> {
        self.keys.get(verification_method).map(|key| {
            format!("z{}", BASE64.encode(key.verifying_key().as_bytes()))
        })
    }

    fn key_for(&self, verification_method: &str) -> Result<SigningKey, ProofError> {
        self.keys
            .get(verification_method)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ProofError::KeyNotFound(verification_method.to_string()))
    }
}

#[async_trait]
impl KeyProvider for InMemoryKeyProvider {
    async fn sign(&self, data: &[u8], verification_method: &str) -> Result<Vec<u8>, ProofError> {
        let key = self.key_for(verification_method)?;
        Ok(key.sign(data).to_bytes().to_vec())
    }

    async fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        verification_method: &str,
    ) -> Result<bool, ProofError> {
        let key = self.key_for(verification_method)?;
        let signature = Signature::from_slice(signature)
            .map_err(|e| ProofError::InvalidProofValue(e.to_string()))?;
        Ok(key.verifying_key().verify(data, &signature).is_ok())
    }

    async fn key_handle(&self, did: &str) -> Result<KeyHandle, ProofError> {
        let prefix = format!("{}#", did);
        self.keys
            .iter()
            .find(|entry| entry.key().starts_with(&prefix))
            .map(|entry| KeyHandle {
                verification_method: entry.key().clone(),
                controller: did.to_string(),
                scheme: ProofScheme::Ed25519Signature2020,
            })
            .ok_or_else(|| ProofError::KeyNotFound(did.to_string()))
    }
}
