use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use credence_core::{CREDENTIALS_V1_CONTEXT, VERIFIABLE_PRESENTATION_TYPE};
use credence_credentials::VerifiableCredential;
use credence_proof::ProofRepresentation;

use crate::error::PresentationError;

/// W3C Verifiable Presentation: a holder-signed bundle of credentials
/// assembled for one verifier interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiablePresentation {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub presentation_type: Vec<String>,
    pub id: String,
    pub holder: String,
    #[serde(rename = "verifiableCredential")]
    pub verifiable_credential: Vec<VerifiableCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Presentation-level metadata (ZKP field lists, nonces).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofRepresentation>,
}

impl VerifiablePresentation {
    pub fn new(holder: impl Into<String>, credentials: Vec<VerifiableCredential>) -> Self {
        Self {
            context: vec![CREDENTIALS_V1_CONTEXT.to_string()],
            presentation_type: vec![VERIFIABLE_PRESENTATION_TYPE.to_string()],
            id: format!("urn:uuid:{}", Uuid::now_v7()),
            holder: holder.into(),
            verifiable_credential: credentials,
            audience: None,
            challenge: None,
            domain: None,
            metadata: Map::new(),
            proof: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.proof.is_some()
    }

    /// The presentation serialized without its proof, for signing and
    /// verification.
    pub fn signing_payload(&self) -> Result<Value, PresentationError> {
        let mut value = serde_json::to_value(self)?;
        if let Some(obj) = value.as_object_mut() {
            obj.remove("proof");
        }
        Ok(value)
    }

    /// Add a context or type marker unless already present.
    pub fn add_context(&mut self, context: &str) {
        if !self.context.iter().any(|c| c == context) {
            self.context.push(context.to_string());
        }
    }

    pub fn add_type(&mut self, presentation_type: &str) {
        if !self.presentation_type.iter().any(|t| t == presentation_type) {
            self.presentation_type.push(presentation_type.to_string());
        }
    }
}
