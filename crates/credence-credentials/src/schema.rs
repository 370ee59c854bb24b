use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CredentialError;

/// One claim a schema knows about: its name, the JSON type its value must
/// carry, and whether issuance may omit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDefinition {
    pub name: String,
    /// One of "string", "integer", "number", "boolean", "date". Dates are
    /// checked as strings; unknown type names match anything.
    pub value_type: String,
    /// Required claims fail validation when absent; optional claims are
    /// type-checked only when present.
    pub required: bool,
    pub description: Option<String>,
}

/// The claim shape a credential type promises. Issuance requests that name
/// a schema are checked against it before signing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSchema {
    pub id: String,
    pub name: String,
    pub version: String,
    pub claims: Vec<ClaimDefinition>,
    pub description: String,
}

/// Validates issuance claims against a referenced schema.
#[async_trait]
pub trait SchemaValidator: Send + Sync {
    async fn validate(
        &self,
        schema_ref: &str,
        claims: &Map<String, Value>,
    ) -> Result<(), CredentialError>;
}

/// Concurrent in-memory schema store, doubling as the default
/// [`SchemaValidator`]. Ships with the diploma and membership schemas
/// registered.
pub struct SchemaRegistry {
    schemas: DashMap<String, CredentialSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let registry = Self {
            schemas: DashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    /// Create an empty registry with no built-ins.
    pub fn empty() -> Self {
        Self {
            schemas: DashMap::new(),
        }
    }

    fn register_builtins(&self) {
        self.schemas.insert(
            "diploma-v1".into(),
            CredentialSchema {
                id: "diploma-v1".into(),
                name: "Diploma".into(),
                version: "1.0.0".into(),
                description: "Academic degree attestation".into(),
                claims: vec![
                    ClaimDefinition {
                        name: "degree".into(),
                        value_type: "string".into(),
                        required: true,
                        description: Some("Degree awarded".into()),
                    },
                    ClaimDefinition {
                        name: "institution".into(),
                        value_type: "string".into(),
                        required: true,
                        description: Some("Awarding institution".into()),
                    },
                    ClaimDefinition {
                        name: "graduation_date".into(),
                        value_type: "date".into(),
                        required: false,
                        description: Some("Graduation date (ISO 8601)".into()),
                    },
                ],
            },
        );

        self.schemas.insert(
            "membership-v1".into(),
            CredentialSchema {
                id: "membership-v1".into(),
                name: "Membership".into(),
                version: "1.0.0".into(),
                description: "Organization membership attestation".into(),
                claims: vec![
                    ClaimDefinition {
                        name: "organization".into(),
                        value_type: "string".into(),
                        required: true,
                        description: Some("Organization name".into()),
                    },
                    ClaimDefinition {
                        name: "member_since".into(),
                        value_type: "date".into(),
                        required: true,
                        description: Some("Membership start date".into()),
                    },
                    ClaimDefinition {
                        name: "tier".into(),
                        value_type: "string".into(),
                        required: false,
                        description: Some("Membership tier".into()),
                    },
                ],
            },
        );
    }

    /// Register a schema under its id, replacing any previous version.
    /// A schema with no claim definitions is rejected.
    pub fn register(&self, schema: CredentialSchema) -> Result<(), CredentialError> {
        if schema.claims.is_empty() {
            return Err(CredentialError::InvalidSchema(
                "schema must have at least one claim".into(),
            ));
        }
        self.schemas.insert(schema.id.clone(), schema);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<CredentialSchema> {
        self.schemas.get(id).map(|entry| entry.clone())
    }

    /// Ids of every registered schema, in no particular order.
    pub fn list(&self) -> Vec<String> {
        self.schemas.iter().map(|e| e.key().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.schemas.len()
    }

    fn value_matches(value: &Value, value_type: &str) -> bool {
        match value_type {
            "string" | "date" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            _ => true,
        }
    }

    /// Validate claims against a schema: required claims must be present,
    /// declared claims must carry the declared value type.
    pub fn validate_claims(
        &self,
        schema_id: &str,
        claims: &Map<String, Value>,
    ) -> Result<(), CredentialError> {
        let schema = self
            .get(schema_id)
            .ok_or_else(|| CredentialError::SchemaNotFound(schema_id.to_string()))?;

        for claim_def in &schema.claims {
            match claims.get(&claim_def.name) {
                None if claim_def.required => {
                    return Err(CredentialError::SchemaValidation(format!(
                        "missing required claim: {}",
                        claim_def.name
                    )));
                }
                Some(value) if !Self::value_matches(value, &claim_def.value_type) => {
                    return Err(CredentialError::SchemaValidation(format!(
                        "claim {} must be of type {}",
                        claim_def.name, claim_def.value_type
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaValidator for SchemaRegistry {
    async fn validate(
        &self,
        schema_ref: &str,
        claims: &Map<String, Value>,
    ) -> Result<(), CredentialError> {
        self.validate_claims(schema_ref, claims)
    }
}
