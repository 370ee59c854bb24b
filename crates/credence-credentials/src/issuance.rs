use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use credence_core::{new_correlation_id, Did, EngineConfig};
use credence_identity::{primary_verification_method, DidResolver, VerificationRelationship};
use credence_proof::{
    ProofError, ProofPurpose, ProofRepresentation, ProofScheme, ProofServiceFactory,
};

use crate::audit::{AuditOutcome, AuditRecord, AuditSink};
use crate::batch::{BatchItemError, BatchOptions, BatchResult, BatchVerificationResult};
use crate::error::CredentialError;
use crate::model::{CredentialStatus, StatusPurpose, VerifiableCredential};
use crate::schema::SchemaValidator;
use crate::status::CredentialStatusService;
use crate::store::CredentialRepository;
use crate::validator::{CredentialValidator, ValidationOptions, ValidationResult};

/// Everything needed to issue one credential.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub issuer: String,
    pub subject: String,
    pub credential_type: String,
    pub claims: Map<String, Value>,
    /// Issuer-assigned id; a `urn:uuid:` id is generated when absent.
    pub credential_id: Option<String>,
    pub additional_contexts: Vec<String>,
    pub additional_types: Vec<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    /// Scheme override; the engine default applies when absent.
    pub proof_scheme: Option<ProofScheme>,
    /// Schema to validate claims against, when schema validation is on.
    pub schema_ref: Option<String>,
    /// Attach a revocation status descriptor.
    pub with_status: bool,
}

impl IssueRequest {
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        credential_type: impl Into<String>,
        claims: Map<String, Value>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            subject: subject.into(),
            credential_type: credential_type.into(),
            claims,
            credential_id: None,
            additional_contexts: Vec::new(),
            additional_types: Vec::new(),
            expiration_date: None,
            proof_scheme: None,
            schema_ref: None,
            with_status: false,
        }
    }
}

/// Builds, schema-validates, signs, and stores credentials; revokes them;
/// runs the batch variants of both plus batch verification.
pub struct CredentialIssuanceService {
    resolver: Arc<dyn DidResolver>,
    proof_factory: Arc<ProofServiceFactory>,
    repository: Arc<dyn CredentialRepository>,
    schema_validator: Arc<dyn SchemaValidator>,
    status_service: Arc<dyn CredentialStatusService>,
    validator: Arc<CredentialValidator>,
    audit: Arc<dyn AuditSink>,
    config: EngineConfig,
    /// Monotonic status-list index, one slot per status-tracked credential.
    next_status_index: AtomicU64,
}

impl CredentialIssuanceService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: Arc<dyn DidResolver>,
        proof_factory: Arc<ProofServiceFactory>,
        repository: Arc<dyn CredentialRepository>,
        schema_validator: Arc<dyn SchemaValidator>,
        status_service: Arc<dyn CredentialStatusService>,
        validator: Arc<CredentialValidator>,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            resolver,
            proof_factory,
            repository,
            schema_validator,
            status_service,
            validator,
            audit,
            config,
            next_status_index: AtomicU64::new(1),
        }
    }

    fn default_scheme(&self) -> Result<ProofScheme, CredentialError> {
        Ok(self.config.default_proof_scheme.parse::<ProofScheme>()?)
    }

    async fn audit_outcome(
        &self,
        event_type: &str,
        category: &str,
        outcome: AuditOutcome,
        subject_id: Option<String>,
        correlation_id: &str,
        metadata: Map<String, Value>,
    ) {
        let mut record = AuditRecord::new(
            event_type,
            category,
            outcome,
            subject_id,
            correlation_id,
        );
        record.metadata = metadata;
        self.audit.record(record).await;
    }

    /// Issue and store a single signed credential.
    pub async fn issue_credential(
        &self,
        request: &IssueRequest,
        default_scheme: Option<ProofScheme>,
    ) -> Result<VerifiableCredential, CredentialError> {
        let correlation_id = new_correlation_id();
        match self.issue_inner(request, default_scheme).await {
            Ok(credential) => {
                info!(
                    issuer = %credential.issuer,
                    subject = request.subject,
                    credential_id = %credential.id,
                    correlation_id = %correlation_id,
                    "credential issued"
                );
                let mut metadata = Map::new();
                metadata.insert("credential_id".into(), json!(credential.id));
                metadata.insert("credential_type".into(), json!(request.credential_type));
                self.audit_outcome(
                    "credential.issue",
                    "issuance",
                    AuditOutcome::Success,
                    Some(request.subject.clone()),
                    &correlation_id,
                    metadata,
                )
                .await;
                Ok(credential)
            }
            Err(e) => {
                warn!(
                    issuer = request.issuer,
                    subject = request.subject,
                    correlation_id = %correlation_id,
                    error = %e,
                    "credential issuance failed"
                );
                let mut metadata = Map::new();
                metadata.insert("error".into(), json!(e.to_string()));
                metadata.insert("code".into(), json!(e.code()));
                self.audit_outcome(
                    "credential.issue",
                    "issuance",
                    AuditOutcome::Failure,
                    Some(request.subject.clone()),
                    &correlation_id,
                    metadata,
                )
                .await;
                Err(e)
            }
        }
    }

    async fn issue_inner(
        &self,
        request: &IssueRequest,
        default_scheme: Option<ProofScheme>,
    ) -> Result<VerifiableCredential, CredentialError> {
        if request.issuer.trim().is_empty() {
            return Err(CredentialError::Validation("issuer DID is required".into()));
        }
        if request.subject.trim().is_empty() {
            return Err(CredentialError::Validation(
                "subject DID is required".into(),
            ));
        }
        if request.credential_type.trim().is_empty() {
            return Err(CredentialError::Validation(
                "credential type is required".into(),
            ));
        }
        if request.claims.is_empty() {
            return Err(CredentialError::Validation(
                "at least one claim is required".into(),
            ));
        }
        Did::new(&request.issuer)?;
        Did::new(&request.subject)?;

        let issuer_doc = self.resolver.resolve(&request.issuer).await?;
        self.resolver.resolve(&request.subject).await?;

        if self.config.validate_schemas {
            if let Some(schema_ref) = &request.schema_ref {
                self.schema_validator
                    .validate(schema_ref, &request.claims)
                    .await?;
            }
        }

        let mut credential = VerifiableCredential::new(
            &request.issuer,
            &request.subject,
            &request.credential_type,
            request.claims.clone(),
        );
        if let Some(id) = &request.credential_id {
            credential.id = id.clone();
        }
        credential.merge_contexts_and_types(
            &request.additional_contexts,
            &request.additional_types,
        );
        if let Some(expiration) = request.expiration_date {
            credential.expiration_date = Some(expiration);
        }
        if request.with_status {
            let index = self.next_status_index.fetch_add(1, Ordering::Relaxed);
            credential.credential_status =
                Some(CredentialStatus::revocation(&request.issuer, index));
        }

        let verification_method = primary_verification_method(
            &issuer_doc,
            VerificationRelationship::AssertionMethod,
        )
        .ok_or_else(|| {
            CredentialError::Proof(ProofError::ProofCreation(format!(
                "issuer {} has no usable verification method",
                request.issuer
            )))
        })?;

        let scheme = request
            .proof_scheme
            .or(default_scheme)
            .map_or_else(|| self.default_scheme(), Ok)?;
        let service = self.proof_factory.service_for(scheme);
        let proof = service
            .create_proof(
                &credential.signing_payload()?,
                &verification_method.id,
                ProofPurpose::AssertionMethod,
                None,
            )
            .await?;
        credential.proof = Some(ProofRepresentation::Structured(proof));

        self.repository.insert(credential.clone()).await?;
        Ok(credential)
    }

    /// Issue a batch sequentially, attributing failures per request.
    pub async fn issue_credentials_batch(
        &self,
        requests: Vec<IssueRequest>,
        options: &BatchOptions,
    ) -> BatchResult<VerifiableCredential, IssueRequest> {
        let mut result = BatchResult::new(options.continue_on_error);
        for request in requests {
            match self
                .issue_credential(&request, options.default_proof_scheme)
                .await
            {
                Ok(credential) => result.successes.push(credential),
                Err(e) => {
                    result.errors.push(BatchItemError {
                        message: e.to_string(),
                        code: e.code().to_string(),
                        request,
                    });
                    if !options.continue_on_error {
                        break;
                    }
                }
            }
        }
        info!(
            issued = result.success_count(),
            failed = result.error_count(),
            "batch issuance finished"
        );
        result
    }

    /// Revoke a stored credential by flipping its status-list flag.
    pub async fn revoke_credential(
        &self,
        credential_id: &str,
        reason: Option<String>,
    ) -> Result<(), CredentialError> {
        let correlation_id = new_correlation_id();
        match self.revoke_inner(credential_id, reason.clone()).await {
            Ok(()) => {
                info!(credential_id, correlation_id = %correlation_id, "credential revoked");
                let mut metadata = Map::new();
                metadata.insert("credential_id".into(), json!(credential_id));
                if let Some(reason) = reason {
                    metadata.insert("reason".into(), json!(reason));
                }
                self.audit_outcome(
                    "credential.revoke",
                    "revocation",
                    AuditOutcome::Success,
                    Some(credential_id.to_string()),
                    &correlation_id,
                    metadata,
                )
                .await;
                Ok(())
            }
            Err(e) => {
                warn!(credential_id, correlation_id = %correlation_id, error = %e,
                    "credential revocation failed");
                let mut metadata = Map::new();
                metadata.insert("error".into(), json!(e.to_string()));
                self.audit_outcome(
                    "credential.revoke",
                    "revocation",
                    AuditOutcome::Failure,
                    Some(credential_id.to_string()),
                    &correlation_id,
                    metadata,
                )
                .await;
                Err(e)
            }
        }
    }

    async fn revoke_inner(
        &self,
        credential_id: &str,
        reason: Option<String>,
    ) -> Result<(), CredentialError> {
        let credential = self
            .repository
            .get(credential_id)
            .await?
            .ok_or_else(|| CredentialError::CredentialNotFound(credential_id.to_string()))?;
        let status = credential.credential_status.as_ref().ok_or_else(|| {
            CredentialError::Validation(format!(
                "credential {} has no status descriptor",
                credential_id
            ))
        })?;
        self.status_service.mark_revoked(&status.id, reason).await
    }

    /// Revoke a batch of credential ids sequentially.
    pub async fn revoke_credentials_batch(
        &self,
        credential_ids: Vec<String>,
        options: &BatchOptions,
    ) -> BatchResult<String, String> {
        let mut result = BatchResult::new(options.continue_on_error);
        for credential_id in credential_ids {
            match self.revoke_credential(&credential_id, None).await {
                Ok(()) => result.successes.push(credential_id),
                Err(e) => {
                    result.errors.push(BatchItemError {
                        message: e.to_string(),
                        code: e.code().to_string(),
                        request: credential_id,
                    });
                    if !options.continue_on_error {
                        break;
                    }
                }
            }
        }
        info!(
            revoked = result.success_count(),
            failed = result.error_count(),
            "batch revocation finished"
        );
        result
    }

    /// Caller options with engine defaults folded in. The configured trust
    /// list applies when the caller supplies none, and setting
    /// `check_revocation` to false disables status checks engine-wide.
    fn effective_options(&self, options: &ValidationOptions) -> ValidationOptions {
        let mut effective = options.clone();
        if effective.trusted_issuers.is_empty() {
            effective.trusted_issuers = self.config.trusted_issuers.clone();
        }
        effective.check_status = effective.check_status && self.config.check_revocation;
        effective
    }

    /// Verify a stored or supplied credential. Verification itself lives in
    /// [`CredentialValidator`]; this applies the engine configuration on top
    /// of the caller's options.
    pub async fn verify_credential(
        &self,
        credential: &VerifiableCredential,
        options: &ValidationOptions,
    ) -> ValidationResult {
        let effective = self.effective_options(options);
        self.validator
            .validate_credential(credential, &effective)
            .await
    }

    /// Verify many credentials, collecting per-item results.
    pub async fn verify_credentials_batch(
        &self,
        credentials: &[VerifiableCredential],
        options: &ValidationOptions,
    ) -> BatchVerificationResult {
        let started = Instant::now();
        let effective = self.effective_options(options);
        let mut results = Vec::with_capacity(credentials.len());
        for credential in credentials {
            results.push(
                self.validator
                    .validate_credential(credential, &effective)
                    .await,
            );
        }
        BatchVerificationResult {
            results,
            elapsed: started.elapsed(),
        }
    }

    pub async fn credential(
        &self,
        credential_id: &str,
    ) -> Result<Option<VerifiableCredential>, CredentialError> {
        self.repository.get(credential_id).await
    }

    pub async fn credentials_by_issuer(
        &self,
        issuer: &str,
    ) -> Result<Vec<VerifiableCredential>, CredentialError> {
        self.repository.by_issuer(issuer).await
    }

    pub async fn credentials_by_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<VerifiableCredential>, CredentialError> {
        self.repository.by_subject(subject).await
    }

    /// Flip one status flag on a stored credential.
    pub async fn update_credential_status(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
        flagged: bool,
        reason: Option<String>,
    ) -> Result<(), CredentialError> {
        let credential = self
            .repository
            .get(credential_id)
            .await?
            .ok_or_else(|| CredentialError::CredentialNotFound(credential_id.to_string()))?;
        let status = credential.credential_status.as_ref().ok_or_else(|| {
            CredentialError::Validation(format!(
                "credential {} has no status descriptor",
                credential_id
            ))
        })?;
        self.status_service
            .set_flag(&status.id, purpose, flagged, reason)
            .await
    }
}
