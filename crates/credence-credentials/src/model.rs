use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use credence_core::{CREDENTIALS_V1_CONTEXT, VERIFIABLE_CREDENTIAL_TYPE};
use credence_proof::ProofRepresentation;

use crate::error::CredentialError;

/// What a status flag asserts about the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusPurpose {
    #[serde(rename = "revocation")]
    Revocation,
    #[serde(rename = "suspension")]
    Suspension,
}

/// Status descriptor attached to a credential at issuance. The descriptor
/// only references the status list; the status service owns the flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub id: String,
    #[serde(rename = "type")]
    pub status_type: String,
    #[serde(rename = "statusPurpose")]
    pub purpose: StatusPurpose,
    #[serde(rename = "statusListCredential")]
    pub status_list: String,
    #[serde(rename = "statusListIndex")]
    pub status_list_index: u64,
}

impl CredentialStatus {
    /// Default revocation descriptor for an issuer, with the list index
    /// assigned by the issuance service.
    pub fn revocation(issuer: &str, index: u64) -> Self {
        let status_list = format!("{}/credentials/status/list", issuer);
        Self {
            id: format!("{}#{}", status_list, index),
            status_type: "RevocationList2020Status".into(),
            purpose: StatusPurpose::Revocation,
            status_list,
            status_list_index: index,
        }
    }
}

/// W3C Verifiable Credential.
///
/// A credential without a proof is unsigned and is never reported valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    pub id: String,
    pub issuer: String,
    #[serde(rename = "issuanceDate")]
    pub issuance_date: DateTime<Utc>,
    #[serde(
        rename = "expirationDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Claim map, always containing the subject's `id`.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: Map<String, Value>,
    #[serde(
        rename = "credentialStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credential_status: Option<CredentialStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
    #[serde(
        rename = "termsOfUse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub terms_of_use: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofRepresentation>,
}

impl VerifiableCredential {
    /// Build an unsigned credential with a generated `urn:uuid:` id.
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        credential_type: impl Into<String>,
        claims: Map<String, Value>,
    ) -> Self {
        let mut credential_subject = Map::new();
        credential_subject.insert("id".into(), Value::String(subject.into()));
        for (name, value) in claims {
            credential_subject.insert(name, value);
        }
        Self {
            context: vec![CREDENTIALS_V1_CONTEXT.to_string()],
            credential_type: vec![
                VERIFIABLE_CREDENTIAL_TYPE.to_string(),
                credential_type.into(),
            ],
            id: format!("urn:uuid:{}", Uuid::now_v7()),
            issuer: issuer.into(),
            issuance_date: Utc::now(),
            expiration_date: None,
            credential_subject,
            credential_status: None,
            evidence: None,
            terms_of_use: None,
            proof: None,
        }
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration);
        self
    }

    /// The subject's DID, read from `credentialSubject.id`.
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|exp| exp < now)
    }

    pub fn is_signed(&self) -> bool {
        self.proof.is_some()
    }

    /// The document bytes-to-sign: the credential serialized without its
    /// proof. Signing and verification must both use this shape.
    pub fn signing_payload(&self) -> Result<Value, CredentialError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("proof");
        }
        Ok(value)
    }

    /// Merge extra contexts and types, skipping duplicates.
    pub fn merge_contexts_and_types(&mut self, contexts: &[String], types: &[String]) {
        for ctx in contexts {
            if !self.context.contains(ctx) {
                self.context.push(ctx.clone());
            }
        }
        for ty in types {
            if !self.credential_type.contains(ty) {
                self.credential_type.push(ty.clone());
            }
        }
    }
}
