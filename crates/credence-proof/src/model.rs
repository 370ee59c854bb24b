use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ProofError;
use crate::scheme::ProofScheme;

/// The purpose a proof was created for, matching the verification
/// relationship the signing key must appear under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofPurpose {
    #[serde(rename = "assertionMethod")]
    AssertionMethod,
    #[serde(rename = "authentication")]
    Authentication,
    #[serde(rename = "keyAgreement")]
    KeyAgreement,
    #[serde(rename = "capabilityDelegation")]
    CapabilityDelegation,
    #[serde(rename = "capabilityInvocation")]
    CapabilityInvocation,
}

impl ProofPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofPurpose::AssertionMethod => "assertionMethod",
            ProofPurpose::Authentication => "authentication",
            ProofPurpose::KeyAgreement => "keyAgreement",
            ProofPurpose::CapabilityDelegation => "capabilityDelegation",
            ProofPurpose::CapabilityInvocation => "capabilityInvocation",
        }
    }
}

/// A cryptographic proof attached to a credential or presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: ProofScheme,
    pub created: DateTime<Utc>,
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,
    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,
    /// Base64-encoded signature over the canonicalized document.
    #[serde(rename = "proofValue")]
    pub proof_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// A proof as it appears on the wire: either a well-formed [`Proof`] or a
/// loose JSON document from a peer we do not control. Callers dispatch by
/// match arm instead of probing field types at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofRepresentation {
    Structured(Proof),
    Raw(Value),
}

impl ProofRepresentation {
    /// Parse a JSON value, preferring the structured form.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<Proof>(value.clone()) {
            Ok(proof) => ProofRepresentation::Structured(proof),
            Err(_) => ProofRepresentation::Raw(value),
        }
    }

    /// The declared scheme, parsed from the `type` field in the raw form.
    pub fn scheme(&self) -> Result<ProofScheme, ProofError> {
        match self {
            ProofRepresentation::Structured(proof) => Ok(proof.proof_type),
            ProofRepresentation::Raw(value) => {
                let declared = value
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ProofError::InvalidProofValue("proof has no type".into()))?;
                declared.parse()
            }
        }
    }

    /// The declared verification method reference, if present.
    pub fn verification_method(&self) -> Option<&str> {
        match self {
            ProofRepresentation::Structured(proof) => Some(&proof.verification_method),
            ProofRepresentation::Raw(value) => {
                value.get("verificationMethod").and_then(Value::as_str)
            }
        }
    }

    /// Promote to a structured proof, failing on malformed raw documents.
    pub fn into_structured(self) -> Result<Proof, ProofError> {
        match self {
            ProofRepresentation::Structured(proof) => Ok(proof),
            ProofRepresentation::Raw(value) => serde_json::from_value(value)
                .map_err(|e| ProofError::InvalidProofValue(e.to_string())),
        }
    }
}

/// Serialize a JSON value with object keys sorted recursively, so that
/// signing and verification operate over identical bytes regardless of the
/// field order a peer produced.
pub fn canonical_json(value: &Value) -> Result<Vec<u8>, ProofError> {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<&String, Value> =
                    map.iter().map(|(k, v)| (k, sort(v))).collect();
                serde_json::to_value(sorted).unwrap_or(Value::Null)
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    Ok(serde_json::to_vec(&sort(value))?)
}
