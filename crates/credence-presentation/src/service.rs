use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use credence_core::{Did, BBS_SIGNATURE_TYPE, BBS_V1_CONTEXT};
use credence_credentials::{
    CredentialValidator, ValidationOptions, VerifiableCredential,
};
use credence_identity::{
    primary_verification_method, DidDocument, DidResolver, VerificationRelationship,
};
use credence_proof::{
    ProofError, ProofPurpose, ProofRepresentation, ProofScheme, ProofServiceFactory,
};

use crate::error::PresentationError;
use crate::model::VerifiablePresentation;

/// Assembly options shared by all presentation variants.
#[derive(Debug, Clone, Default)]
pub struct PresentationOptions {
    pub id: Option<String>,
    pub audience: Option<String>,
    pub challenge: Option<String>,
    pub domain: Option<String>,
    pub additional_contexts: Vec<String>,
    pub additional_types: Vec<String>,
    pub proof_scheme: Option<ProofScheme>,
    /// Presentation metadata, set before signing so the proof covers it.
    pub metadata: Map<String, Value>,
}

/// Derive a reduced credential disclosing only the named claims.
///
/// The result keeps the original id, issuer, contexts, types, dates,
/// status, evidence, and terms of use; its subject is exactly the subject
/// id plus the disclosed fields. The original proof does not cover the
/// reduced document and is dropped.
pub fn derive_credential(
    credential: &VerifiableCredential,
    disclosed: &[String],
) -> VerifiableCredential {
    let mut derived = credential.clone();
    derived.proof = None;
    let mut subject = Map::new();
    if let Some(id) = credential.subject_id() {
        subject.insert("id".into(), Value::String(id.to_string()));
    }
    for field in disclosed {
        if field == "id" {
            continue;
        }
        if let Some(value) = credential.credential_subject.get(field) {
            subject.insert(field.clone(), value.clone());
        }
    }
    derived.credential_subject = subject;
    derived
}

/// Assembles and signs verifiable presentations on behalf of a holder.
pub struct PresentationService {
    resolver: Arc<dyn DidResolver>,
    proof_factory: Arc<ProofServiceFactory>,
    validator: Arc<CredentialValidator>,
}

impl PresentationService {
    pub fn new(
        resolver: Arc<dyn DidResolver>,
        proof_factory: Arc<ProofServiceFactory>,
        validator: Arc<CredentialValidator>,
    ) -> Self {
        Self {
            resolver,
            proof_factory,
            validator,
        }
    }

    /// Validate the supplied credentials, discarding invalid ones with a
    /// logged warning. Fails only when none survive.
    async fn surviving_credentials(
        &self,
        credentials: Vec<VerifiableCredential>,
    ) -> Result<Vec<VerifiableCredential>, PresentationError> {
        let options = ValidationOptions::default();
        let mut surviving = Vec::with_capacity(credentials.len());
        for credential in credentials {
            let result = self.validator.validate_credential(&credential, &options).await;
            if result.is_valid {
                surviving.push(credential);
            } else {
                warn!(
                    credential_id = %credential.id,
                    errors = result.errors.len(),
                    "discarding invalid credential from presentation"
                );
            }
        }
        if surviving.is_empty() {
            return Err(PresentationError::Validation(
                "no valid credentials to present".into(),
            ));
        }
        Ok(surviving)
    }

    fn assemble(
        holder: &str,
        credentials: Vec<VerifiableCredential>,
        options: &PresentationOptions,
    ) -> VerifiablePresentation {
        let mut vp = VerifiablePresentation::new(holder, credentials);
        if let Some(id) = &options.id {
            vp.id = id.clone();
        }
        vp.audience = options.audience.clone();
        vp.challenge = options.challenge.clone();
        vp.domain = options.domain.clone();
        for context in &options.additional_contexts {
            vp.add_context(context);
        }
        for presentation_type in &options.additional_types {
            vp.add_type(presentation_type);
        }
        vp.metadata = options.metadata.clone();
        vp
    }

    async fn sign(
        &self,
        vp: &mut VerifiablePresentation,
        holder_doc: &DidDocument,
        scheme: ProofScheme,
    ) -> Result<(), PresentationError> {
        let verification_method = primary_verification_method(
            holder_doc,
            VerificationRelationship::Authentication,
        )
        .ok_or_else(|| {
            PresentationError::Proof(ProofError::ProofCreation(format!(
                "holder {} has no usable verification method",
                vp.holder
            )))
        })?;

        let service = self.proof_factory.service_for(scheme);
        let mut proof = service
            .create_proof(
                &vp.signing_payload()?,
                &verification_method.id,
                ProofPurpose::Authentication,
                None,
            )
            .await?;
        proof.challenge = vp.challenge.clone();
        proof.domain = vp.domain.clone();
        vp.proof = Some(ProofRepresentation::Structured(proof));
        Ok(())
    }

    /// Create a presentation embedding the supplied credentials in full.
    pub async fn create_presentation(
        &self,
        holder: &str,
        credentials: Vec<VerifiableCredential>,
        options: &PresentationOptions,
    ) -> Result<VerifiablePresentation, PresentationError> {
        let holder_doc = self.resolver.resolve(holder).await?;
        let surviving = self.surviving_credentials(credentials).await?;

        let mut vp = Self::assemble(holder, surviving, options);
        let scheme = options
            .proof_scheme
            .unwrap_or(ProofScheme::Ed25519Signature2020);
        self.sign(&mut vp, &holder_doc, scheme).await?;

        info!(
            holder,
            presentation_id = %vp.id,
            credentials = vp.verifiable_credential.len(),
            "presentation created"
        );
        Ok(vp)
    }

    /// Create a presentation with per-credential selective disclosure.
    ///
    /// `disclosures` maps credential id to the claim names to reveal;
    /// credentials without an entry are embedded unmodified. ZKP mode adds
    /// the BBS+ context and type markers for downstream verifiers.
    pub async fn create_selective_disclosure_presentation(
        &self,
        holder: &str,
        credentials: Vec<VerifiableCredential>,
        disclosures: &HashMap<String, Vec<String>>,
        zkp: bool,
        options: &PresentationOptions,
    ) -> Result<VerifiablePresentation, PresentationError> {
        let holder_doc = self.resolver.resolve(holder).await?;
        // Originals are validated; derivation happens on the survivors so
        // the reduced (unsigned) documents are never rejected here.
        let surviving = self.surviving_credentials(credentials).await?;
        let embedded: Vec<VerifiableCredential> = surviving
            .iter()
            .map(|credential| match disclosures.get(&credential.id) {
                Some(disclosed) => derive_credential(credential, disclosed),
                None => credential.clone(),
            })
            .collect();

        let mut vp = Self::assemble(holder, embedded, options);
        if zkp {
            vp.add_context(BBS_V1_CONTEXT);
            vp.add_type(BBS_SIGNATURE_TYPE);
        }
        let scheme = options
            .proof_scheme
            .unwrap_or(ProofScheme::Ed25519Signature2020);
        self.sign(&mut vp, &holder_doc, scheme).await?;

        info!(
            holder,
            presentation_id = %vp.id,
            zkp,
            "selective disclosure presentation created"
        );
        Ok(vp)
    }

    /// ZKP-oriented presentation: selective disclosure plus hidden and
    /// revealed field metadata per credential.
    pub async fn create_zkp_presentation(
        &self,
        holder: &str,
        credentials: Vec<VerifiableCredential>,
        disclosures: &HashMap<String, Vec<String>>,
        options: &PresentationOptions,
    ) -> Result<VerifiablePresentation, PresentationError> {
        let mut revealed_fields = Map::new();
        let mut hidden_fields = Map::new();
        for credential in &credentials {
            let Some(disclosed) = disclosures.get(&credential.id) else {
                continue;
            };
            let revealed: Vec<&String> = disclosed.iter().filter(|f| *f != "id").collect();
            let hidden: Vec<&String> = credential
                .credential_subject
                .keys()
                .filter(|name| name.as_str() != "id" && !disclosed.contains(name))
                .collect();
            revealed_fields.insert(credential.id.clone(), json!(revealed));
            hidden_fields.insert(credential.id.clone(), json!(hidden));
        }

        let mut options = options.clone();
        options
            .metadata
            .insert("revealedFields".into(), Value::Object(revealed_fields));
        options
            .metadata
            .insert("hiddenFields".into(), Value::Object(hidden_fields));
        self.create_selective_disclosure_presentation(holder, credentials, disclosures, true, &options)
            .await
    }

    /// Challenge-response presentation. An already-expired challenge is
    /// rejected outright.
    pub async fn create_challenge_response_presentation(
        &self,
        holder: &str,
        credentials: Vec<VerifiableCredential>,
        challenge: &str,
        challenge_expires_at: Option<DateTime<Utc>>,
        options: &PresentationOptions,
    ) -> Result<VerifiablePresentation, PresentationError> {
        if let Some(expires_at) = challenge_expires_at {
            if expires_at < Utc::now() {
                return Err(PresentationError::ChallengeExpired(expires_at.to_rfc3339()));
            }
        }
        let mut options = options.clone();
        options.challenge = Some(challenge.to_string());
        options.metadata.insert("nonce".into(), json!(challenge));
        self.create_presentation(holder, credentials, &options).await
    }

    /// Domain-bound presentation. With ownership verification on, a
    /// `did:web` holder must embed the requested domain (case-insensitive);
    /// other DID methods pass.
    pub async fn create_domain_bound_presentation(
        &self,
        holder: &str,
        credentials: Vec<VerifiableCredential>,
        domain: &str,
        verify_ownership: bool,
        options: &PresentationOptions,
    ) -> Result<VerifiablePresentation, PresentationError> {
        if verify_ownership {
            let did = Did::new(holder)
                .map_err(|e| PresentationError::Validation(e.to_string()))?;
            if let Some(embedded) = did.web_domain() {
                if !embedded.eq_ignore_ascii_case(domain) {
                    return Err(PresentationError::DomainMismatch(format!(
                        "holder domain {} does not match {}",
                        embedded, domain
                    )));
                }
            }
        }
        let mut options = options.clone();
        options.domain = Some(domain.to_string());
        self.create_presentation(holder, credentials, &options).await
    }
}
