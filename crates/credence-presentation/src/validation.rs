use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::debug;

use credence_credentials::{
    CredentialStatusService, IssueCode, ValidationIssue, VerifiableCredential,
};
use credence_identity::{
    find_verification_method, DidResolver, VerificationRelationship,
};
use credence_proof::{ProofError, ProofPurpose, ProofServiceFactory};

use crate::model::VerifiablePresentation;

/// Verifier expectations for one presentation.
#[derive(Debug, Clone)]
pub struct PresentationValidationOptions {
    pub expected_challenge: Option<String>,
    pub expected_domain: Option<String>,
    /// Whether embedded credential status descriptors are checked.
    pub check_status: bool,
    /// Issuer allow-list; absence from a non-empty list is a warning.
    pub trusted_issuers: Vec<String>,
}

impl Default for PresentationValidationOptions {
    fn default() -> Self {
        Self {
            expected_challenge: None,
            expected_domain: None,
            check_status: true,
            trusted_issuers: Vec::new(),
        }
    }
}

/// Accumulated presentation verification outcome.
#[derive(Debug, Default)]
pub struct PresentationValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub presentation_id: Option<String>,
    pub holder: Option<String>,
    /// Flattened, credential-prefixed claim map.
    pub claims: Map<String, Value>,
}

impl PresentationValidationResult {
    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// Per-presentation results of a batch validation run.
#[derive(Debug)]
pub struct PresentationBatchResult {
    pub results: Vec<PresentationValidationResult>,
    pub elapsed: Duration,
}

impl PresentationBatchResult {
    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.results.len() - self.valid_count()
    }
}

/// Flatten every embedded credential's claims into one prefixed map,
/// including per-credential issuer, type, and date metadata.
pub fn extract_claims(presentation: &VerifiablePresentation) -> Map<String, Value> {
    let mut claims = Map::new();
    for (index, credential) in presentation.verifiable_credential.iter().enumerate() {
        let prefix = format!("credential_{}", index);
        for (name, value) in &credential.credential_subject {
            if name == "id" {
                continue;
            }
            claims.insert(format!("{}_{}", prefix, name), value.clone());
        }
        claims.insert(format!("{}_issuer", prefix), json!(credential.issuer));
        claims.insert(
            format!("{}_type", prefix),
            json!(credential.credential_type.join(",")),
        );
        claims.insert(
            format!("{}_issuedAt", prefix),
            json!(credential.issuance_date.to_rfc3339()),
        );
        if let Some(expires) = credential.expiration_date {
            claims.insert(format!("{}_expiresAt", prefix), json!(expires.to_rfc3339()));
        }
    }
    claims
}

/// Verifies presentations with the same accumulated-result discipline as
/// single credentials: every check runs, nothing short-circuits, and no
/// internal failure escapes as an error.
pub struct PresentationValidator {
    resolver: Arc<dyn DidResolver>,
    proof_factory: Arc<ProofServiceFactory>,
    status_service: Arc<dyn CredentialStatusService>,
}

impl PresentationValidator {
    pub fn new(
        resolver: Arc<dyn DidResolver>,
        proof_factory: Arc<ProofServiceFactory>,
        status_service: Arc<dyn CredentialStatusService>,
    ) -> Self {
        Self {
            resolver,
            proof_factory,
            status_service,
        }
    }

    /// Check a presentation's embedded challenge against an expectation.
    /// No expectation means any challenge (or none) is acceptable.
    pub fn validate_challenge(
        presentation: &VerifiablePresentation,
        expected: Option<&str>,
    ) -> bool {
        match expected {
            Some(expected) => presentation.challenge.as_deref() == Some(expected),
            None => true,
        }
    }

    /// Check a presentation's domain binding against an expectation.
    /// No expectation means any domain (or none) is acceptable.
    pub fn validate_domain_binding(
        presentation: &VerifiablePresentation,
        expected: Option<&str>,
    ) -> bool {
        match expected {
            Some(expected) => presentation.domain.as_deref() == Some(expected),
            None => true,
        }
    }

    pub async fn validate_presentation(
        &self,
        presentation: &VerifiablePresentation,
        options: &PresentationValidationOptions,
    ) -> PresentationValidationResult {
        let mut result = PresentationValidationResult {
            presentation_id: Some(presentation.id.clone()),
            holder: Some(presentation.holder.clone()),
            ..Default::default()
        };

        if presentation.holder.trim().is_empty() {
            result.errors.push(ValidationIssue {
                code: IssueCode::Malformed,
                message: "presentation has no holder".into(),
            });
        }
        if presentation.verifiable_credential.is_empty() {
            result.errors.push(ValidationIssue {
                code: IssueCode::Malformed,
                message: "presentation embeds no credentials".into(),
            });
        }

        if !Self::validate_challenge(presentation, options.expected_challenge.as_deref()) {
            result.errors.push(ValidationIssue {
                code: IssueCode::ChallengeMismatch,
                message: "presentation challenge does not match expectation".into(),
            });
        }
        if !Self::validate_domain_binding(presentation, options.expected_domain.as_deref()) {
            result.errors.push(ValidationIssue {
                code: IssueCode::DomainMismatch,
                message: "presentation domain does not match expectation".into(),
            });
        }

        self.verify_holder_proof(presentation, &mut result).await;

        for (index, credential) in presentation.verifiable_credential.iter().enumerate() {
            self.check_embedded_credential(index, credential, options, &mut result)
                .await;
        }

        result.claims = extract_claims(presentation);
        result.is_valid = result.errors.is_empty();
        debug!(
            presentation_id = %presentation.id,
            valid = result.is_valid,
            errors = result.errors.len(),
            "presentation validated"
        );
        result
    }

    async fn verify_holder_proof(
        &self,
        presentation: &VerifiablePresentation,
        result: &mut PresentationValidationResult,
    ) {
        let Some(representation) = presentation.proof.clone() else {
            result.errors.push(ValidationIssue {
                code: IssueCode::MissingProof,
                message: "presentation is unsigned".into(),
            });
            return;
        };
        let proof = match representation.into_structured() {
            Ok(proof) => proof,
            Err(ProofError::UnsupportedProofType(ty)) => {
                result.errors.push(ValidationIssue {
                    code: IssueCode::UnsupportedProofType,
                    message: format!("unsupported proof type: {}", ty),
                });
                return;
            }
            Err(e) => {
                result.errors.push(ValidationIssue {
                    code: IssueCode::Malformed,
                    message: e.to_string(),
                });
                return;
            }
        };

        // A holder proof must be created for authentication; a credential
        // proof pasted onto a presentation is not acceptable.
        if proof.proof_purpose != ProofPurpose::Authentication {
            result.errors.push(ValidationIssue {
                code: IssueCode::ProofVerification,
                message: format!(
                    "presentation proof purpose must be authentication, got {}",
                    proof.proof_purpose.as_str()
                ),
            });
            return;
        }

        let holder_doc = match self.resolver.resolve(&presentation.holder).await {
            Ok(doc) => doc,
            Err(e) => {
                result.errors.push(ValidationIssue {
                    code: IssueCode::DidResolution,
                    message: format!("holder {}: {}", presentation.holder, e),
                });
                return;
            }
        };

        let method = find_verification_method(
            &holder_doc,
            &proof.verification_method,
            VerificationRelationship::Authentication,
        )
        .or_else(|| {
            find_verification_method(
                &holder_doc,
                &proof.verification_method,
                VerificationRelationship::AssertionMethod,
            )
        });
        if method.is_none() {
            result.errors.push(ValidationIssue {
                code: IssueCode::ProofVerification,
                message: format!(
                    "no verification method for {}",
                    proof.verification_method
                ),
            });
            return;
        }

        let payload = match presentation.signing_payload() {
            Ok(payload) => payload,
            Err(e) => {
                result.errors.push(ValidationIssue {
                    code: IssueCode::Malformed,
                    message: e.to_string(),
                });
                return;
            }
        };
        let service = self.proof_factory.service_for(proof.proof_type);
        match service.verify_proof(&payload, &proof).await {
            Ok(true) => {}
            Ok(false) => result.errors.push(ValidationIssue {
                code: IssueCode::ProofVerification,
                message: "presentation proof mismatch".into(),
            }),
            Err(ProofError::NotImplemented(scheme)) => result.errors.push(ValidationIssue {
                code: IssueCode::UnsupportedProofType,
                message: format!("proof scheme not implemented: {}", scheme),
            }),
            Err(e) => result.errors.push(ValidationIssue {
                code: IssueCode::ProofVerification,
                message: e.to_string(),
            }),
        }
    }

    /// Structural checks on an embedded credential. Selectively disclosed
    /// derivatives carry no proof of their own, so signature verification
    /// is deliberately not part of this step.
    async fn check_embedded_credential(
        &self,
        index: usize,
        credential: &VerifiableCredential,
        options: &PresentationValidationOptions,
        result: &mut PresentationValidationResult,
    ) {
        if credential.issuer.trim().is_empty() {
            result.errors.push(ValidationIssue {
                code: IssueCode::Malformed,
                message: format!("credential {} has no issuer", index),
            });
        }
        if credential.subject_id().is_none() {
            result.errors.push(ValidationIssue {
                code: IssueCode::Malformed,
                message: format!("credential {} has no subject id", index),
            });
        }
        if credential.is_expired_at(Utc::now()) {
            result.errors.push(ValidationIssue {
                code: IssueCode::Expired,
                message: format!("credential {} has expired", index),
            });
        }

        if options.check_status {
            if let Some(status) = &credential.credential_status {
                match self.status_service.check_status(&status.id).await {
                    Ok(check) => {
                        if check.is_revoked {
                            result.errors.push(ValidationIssue {
                                code: IssueCode::Revoked,
                                message: format!("credential {} is revoked", index),
                            });
                        }
                        if check.is_suspended {
                            result.errors.push(ValidationIssue {
                                code: IssueCode::Suspended,
                                message: format!("credential {} is suspended", index),
                            });
                        }
                    }
                    Err(e) => result.errors.push(ValidationIssue {
                        code: IssueCode::Revoked,
                        message: format!("status check failed for credential {}: {}", index, e),
                    }),
                }
            }
        }

        if !options.trusted_issuers.is_empty()
            && !options.trusted_issuers.contains(&credential.issuer)
        {
            result.warnings.push(ValidationIssue {
                code: IssueCode::UntrustedIssuer,
                message: format!(
                    "credential {} issuer {} not in trusted list",
                    index, credential.issuer
                ),
            });
        }
    }

    /// Validate many presentations sequentially, with optional per-id
    /// option overrides.
    pub async fn validate_presentations_batch(
        &self,
        presentations: &[VerifiablePresentation],
        options: &PresentationValidationOptions,
        overrides: &HashMap<String, PresentationValidationOptions>,
    ) -> PresentationBatchResult {
        let started = Instant::now();
        let mut results = Vec::with_capacity(presentations.len());
        for presentation in presentations {
            let effective = overrides.get(&presentation.id).unwrap_or(options);
            results.push(self.validate_presentation(presentation, effective).await);
        }
        PresentationBatchResult {
            results,
            elapsed: started.elapsed(),
        }
    }
}
