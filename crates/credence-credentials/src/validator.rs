use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use credence_identity::{
    find_verification_method, DidDocument, DidResolver, VerificationRelationship,
};
use credence_proof::{KeyProvider, ProofError, ProofPurpose, ProofServiceFactory};

use crate::encoding::{classify, decode_token, CredentialEncoding, DecodedToken};
use crate::model::{CredentialStatus, VerifiableCredential};
use crate::status::CredentialStatusService;

/// Why a validation entry was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    Malformed,
    MissingProof,
    ProofVerification,
    UnsupportedProofType,
    DidResolution,
    Expired,
    NotYetValid,
    Revoked,
    Suspended,
    ChallengeMismatch,
    DomainMismatch,
    UntrustedIssuer,
}

#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
}

impl ValidationIssue {
    fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Accumulated verification outcome. Validity is "no errors"; warnings
/// (currently only trust-list absence) never affect it.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub credential_id: Option<String>,
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub credential_types: Vec<String>,
    pub claims: Map<String, Value>,
}

impl ValidationResult {
    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// Caller expectations for one validation run.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Expected anti-replay challenge; mismatch or absence is an error.
    pub expected_challenge: Option<String>,
    /// Whether to consult the status service.
    pub check_status: bool,
    /// Issuer allow-list. Empty disables the check; a non-empty list makes
    /// absence a warning, never an error.
    pub trusted_issuers: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            expected_challenge: None,
            check_status: true,
            trusted_issuers: Vec::new(),
        }
    }
}

/// What the format-specific step hands to the common checks.
#[derive(Default)]
struct ValidationContext {
    status: Option<CredentialStatus>,
    challenge: Option<String>,
}

/// Verifies a single credential in either encoding.
///
/// `validate` never returns `Err`: verification runs on untrusted input
/// and every internal failure becomes an accumulated error entry.
pub struct CredentialValidator {
    resolver: Arc<dyn DidResolver>,
    key_provider: Arc<dyn KeyProvider>,
    proof_factory: Arc<ProofServiceFactory>,
    status_service: Arc<dyn CredentialStatusService>,
}

impl CredentialValidator {
    pub fn new(
        resolver: Arc<dyn DidResolver>,
        key_provider: Arc<dyn KeyProvider>,
        proof_factory: Arc<ProofServiceFactory>,
        status_service: Arc<dyn CredentialStatusService>,
    ) -> Self {
        Self {
            resolver,
            key_provider,
            proof_factory,
            status_service,
        }
    }

    /// Validate a credential supplied as a compact token or a JSON document.
    pub async fn validate(&self, input: &str, options: &ValidationOptions) -> ValidationResult {
        let mut result = ValidationResult::default();
        let mut context = ValidationContext::default();

        match classify(input) {
            Ok(CredentialEncoding::CompactToken(token)) => match decode_token(&token) {
                Ok(decoded) => {
                    context = self.validate_token(decoded, &mut result).await;
                }
                Err(e) => result
                    .errors
                    .push(ValidationIssue::new(IssueCode::Malformed, e.to_string())),
            },
            Ok(CredentialEncoding::StructuredDocument(doc)) => {
                context = self.validate_document(doc, &mut result).await;
            }
            Err(e) => result
                .errors
                .push(ValidationIssue::new(IssueCode::Malformed, e.to_string())),
        }

        // Status, challenge, and trust checks run regardless of what the
        // signature step found; errors accumulate, never short-circuit.
        self.apply_common_checks(&context, options, &mut result)
            .await;

        result.is_valid = result.errors.is_empty();
        debug!(
            valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "credential validated"
        );
        result
    }

    /// Validate an in-memory credential through the structured path.
    pub async fn validate_credential(
        &self,
        credential: &VerifiableCredential,
        options: &ValidationOptions,
    ) -> ValidationResult {
        match serde_json::to_string(credential) {
            Ok(json) => self.validate(&json, options).await,
            Err(e) => {
                let mut result = ValidationResult::default();
                result
                    .errors
                    .push(ValidationIssue::new(IssueCode::Malformed, e.to_string()));
                result
            }
        }
    }

    async fn resolve_issuer(
        &self,
        issuer: &str,
        result: &mut ValidationResult,
    ) -> Option<DidDocument> {
        match self.resolver.resolve(issuer).await {
            Ok(doc) => Some(doc),
            Err(e) => {
                result.errors.push(ValidationIssue::new(
                    IssueCode::DidResolution,
                    format!("issuer {}: {}", issuer, e),
                ));
                None
            }
        }
    }

    /// Locate a verification method for assertion, falling back to the
    /// authentication relationship.
    fn assertion_method<'a>(
        doc: &'a DidDocument,
        key_id: &str,
    ) -> Option<&'a credence_identity::VerificationMethod> {
        find_verification_method(doc, key_id, VerificationRelationship::AssertionMethod)
            .or_else(|| {
                find_verification_method(doc, key_id, VerificationRelationship::Authentication)
            })
    }

    async fn validate_token(
        &self,
        decoded: DecodedToken,
        result: &mut ValidationResult,
    ) -> ValidationContext {
        result.credential_id = decoded.claims.jti.clone();
        result.issuer = Some(decoded.claims.iss.clone());
        result.subject = Some(decoded.claims.sub.clone());
        if let Some(ty) = &decoded.claims.credential_type {
            result.credential_types.push(ty.clone());
        }
        result.claims = decoded.claims.extra.clone();

        if let Some(doc) = self.resolve_issuer(&decoded.claims.iss, result).await {
            match Self::assertion_method(&doc, &decoded.header.kid) {
                Some(vm) => {
                    match self
                        .key_provider
                        .verify(
                            decoded.signing_input.as_bytes(),
                            &decoded.signature,
                            &vm.id,
                        )
                        .await
                    {
                        Ok(true) => {}
                        Ok(false) => result.errors.push(ValidationIssue::new(
                            IssueCode::ProofVerification,
                            "token signature mismatch",
                        )),
                        Err(e) => result.errors.push(ValidationIssue::new(
                            IssueCode::ProofVerification,
                            e.to_string(),
                        )),
                    }
                }
                None => result.errors.push(ValidationIssue::new(
                    IssueCode::ProofVerification,
                    format!("no verification method for key {}", decoded.header.kid),
                )),
            }
        }

        let now = Utc::now();
        if let Some(expires_at) = decoded.claims.expires_at() {
            if expires_at < now {
                result.errors.push(ValidationIssue::new(
                    IssueCode::Expired,
                    format!("token expired at {}", expires_at),
                ));
            }
        }
        if let Some(not_before) = decoded.claims.not_before() {
            if not_before > now {
                result.errors.push(ValidationIssue::new(
                    IssueCode::NotYetValid,
                    format!("token not valid before {}", not_before),
                ));
            }
        }

        ValidationContext {
            status: decoded.claims.credential_status,
            challenge: decoded.claims.nonce,
        }
    }

    async fn validate_document(
        &self,
        doc: Value,
        result: &mut ValidationResult,
    ) -> ValidationContext {
        let credential: VerifiableCredential = match serde_json::from_value(doc) {
            Ok(vc) => vc,
            Err(e) => {
                result.errors.push(ValidationIssue::new(
                    IssueCode::Malformed,
                    format!("not a verifiable credential: {}", e),
                ));
                return ValidationContext::default();
            }
        };

        result.credential_id = Some(credential.id.clone());
        result.issuer = Some(credential.issuer.clone());
        result.subject = credential.subject_id().map(str::to_string);
        result.credential_types = credential.credential_type.clone();
        result.claims = credential
            .credential_subject
            .iter()
            .filter(|(name, _)| name.as_str() != "id")
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let mut context = ValidationContext {
            status: credential.credential_status.clone(),
            challenge: None,
        };

        let Some(representation) = credential.proof.clone() else {
            result.errors.push(ValidationIssue::new(
                IssueCode::MissingProof,
                "credential is unsigned",
            ));
            return context;
        };

        match representation.scheme() {
            Ok(_) => {}
            Err(ProofError::UnsupportedProofType(ty)) => {
                result.errors.push(ValidationIssue::new(
                    IssueCode::UnsupportedProofType,
                    format!("unsupported proof type: {}", ty),
                ));
                return context;
            }
            Err(e) => {
                result
                    .errors
                    .push(ValidationIssue::new(IssueCode::Malformed, e.to_string()));
                return context;
            }
        }
        let proof = match representation.into_structured() {
            Ok(proof) => proof,
            Err(e) => {
                result
                    .errors
                    .push(ValidationIssue::new(IssueCode::Malformed, e.to_string()));
                return context;
            }
        };
        context.challenge = proof.challenge.clone();

        // An issuer proof must assert (or at least authenticate); other
        // purposes are recorded as an error but the remaining checks run.
        if !matches!(
            proof.proof_purpose,
            ProofPurpose::AssertionMethod | ProofPurpose::Authentication
        ) {
            result.errors.push(ValidationIssue::new(
                IssueCode::ProofVerification,
                format!(
                    "credential proof purpose must be assertionMethod, got {}",
                    proof.proof_purpose.as_str()
                ),
            ));
        }

        if let Some(issuer_doc) = self.resolve_issuer(&credential.issuer, result).await {
            if Self::assertion_method(&issuer_doc, &proof.verification_method).is_none() {
                result.errors.push(ValidationIssue::new(
                    IssueCode::ProofVerification,
                    format!(
                        "no verification method for {}",
                        proof.verification_method
                    ),
                ));
            } else {
                let service = self.proof_factory.service_for(proof.proof_type);
                match credential.signing_payload() {
                    Ok(payload) => match service.verify_proof(&payload, &proof).await {
                        Ok(true) => {}
                        Ok(false) => result.errors.push(ValidationIssue::new(
                            IssueCode::ProofVerification,
                            "proof signature mismatch",
                        )),
                        Err(ProofError::NotImplemented(scheme)) => {
                            result.errors.push(ValidationIssue::new(
                                IssueCode::UnsupportedProofType,
                                format!("proof scheme not implemented: {}", scheme),
                            ))
                        }
                        Err(e) => result.errors.push(ValidationIssue::new(
                            IssueCode::ProofVerification,
                            e.to_string(),
                        )),
                    },
                    Err(e) => result
                        .errors
                        .push(ValidationIssue::new(IssueCode::Malformed, e.to_string())),
                }
            }
        }

        if credential.is_expired_at(Utc::now()) {
            result.errors.push(ValidationIssue::new(
                IssueCode::Expired,
                format!(
                    "credential expired at {}",
                    credential
                        .expiration_date
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_default()
                ),
            ));
        }

        context
    }

    async fn apply_common_checks(
        &self,
        context: &ValidationContext,
        options: &ValidationOptions,
        result: &mut ValidationResult,
    ) {
        if options.check_status {
            if let Some(status) = &context.status {
                match self.status_service.check_status(&status.id).await {
                    Ok(check) => {
                        if check.is_revoked {
                            result.errors.push(ValidationIssue::new(
                                IssueCode::Revoked,
                                check
                                    .reason
                                    .clone()
                                    .unwrap_or_else(|| "credential revoked".into()),
                            ));
                        }
                        if check.is_suspended {
                            result.errors.push(ValidationIssue::new(
                                IssueCode::Suspended,
                                check
                                    .reason
                                    .clone()
                                    .unwrap_or_else(|| "credential suspended".into()),
                            ));
                        }
                    }
                    Err(e) => result.errors.push(ValidationIssue::new(
                        IssueCode::Revoked,
                        format!("status check failed: {}", e),
                    )),
                }
            }
        }

        if let Some(expected) = &options.expected_challenge {
            if context.challenge.as_deref() != Some(expected.as_str()) {
                result.errors.push(ValidationIssue::new(
                    IssueCode::ChallengeMismatch,
                    "challenge does not match expectation",
                ));
            }
        }

        if !options.trusted_issuers.is_empty() {
            if let Some(issuer) = &result.issuer {
                if !options.trusted_issuers.contains(issuer) {
                    result.warnings.push(ValidationIssue::new(
                        IssueCode::UntrustedIssuer,
                        format!("issuer {} not in trusted list", issuer),
                    ));
                }
            }
        }
    }
}
