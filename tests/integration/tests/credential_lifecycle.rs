//! Full credential lifecycle: issue, verify, tamper, expire, revoke.

use chrono::{Duration, Utc};
use serde_json::json;

use credence_core::EngineConfig;
use credence_credentials::{IssueCode, ValidationOptions};
use credence_integration_tests::{diploma_request, TestEngine};
use credence_proof::ProofScheme;

const ISSUER: &str = "did:example:issuer1";
const SUBJECT: &str = "did:example:subject1";

fn engine() -> TestEngine {
    let engine = TestEngine::new();
    engine.register_participant(ISSUER);
    engine.register_participant(SUBJECT);
    engine
}

#[tokio::test]
async fn test_issue_then_verify_is_valid() {
    let engine = engine();
    let credential = engine
        .issuance
        .issue_credential(&diploma_request(ISSUER, SUBJECT), None)
        .await
        .unwrap();

    assert!(credential.id.starts_with("urn:uuid:"));
    assert_eq!(credential.issuer, ISSUER);
    assert_eq!(credential.credential_subject["degree"], "BSc");
    let proof = credential.proof.clone().unwrap();
    assert_eq!(proof.scheme().unwrap(), ProofScheme::Ed25519Signature2020);

    let result = engine
        .issuance
        .verify_credential(&credential, &ValidationOptions::default())
        .await;
    assert!(result.is_valid, "errors: {:?}", result.errors);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_tampering_breaks_verification() {
    let engine = engine();
    let mut credential = engine
        .issuance
        .issue_credential(&diploma_request(ISSUER, SUBJECT), None)
        .await
        .unwrap();
    credential
        .credential_subject
        .insert("degree".into(), json!("PhD"));

    let result = engine
        .issuance
        .verify_credential(&credential, &ValidationOptions::default())
        .await;
    assert!(!result.is_valid);
    assert!(result.has_error(IssueCode::ProofVerification));
}

#[tokio::test]
async fn test_expired_credential_fails() {
    let engine = engine();
    let mut request = diploma_request(ISSUER, SUBJECT);
    request.expiration_date = Some(Utc::now() - Duration::hours(1));
    let credential = engine
        .issuance
        .issue_credential(&request, None)
        .await
        .unwrap();

    let result = engine
        .issuance
        .verify_credential(&credential, &ValidationOptions::default())
        .await;
    assert!(!result.is_valid);
    assert!(result.has_error(IssueCode::Expired));
}

#[tokio::test]
async fn test_revoke_then_verify_fails() {
    let engine = engine();
    let mut request = diploma_request(ISSUER, SUBJECT);
    request.with_status = true;
    let credential = engine
        .issuance
        .issue_credential(&request, None)
        .await
        .unwrap();

    // Valid before revocation.
    let result = engine
        .issuance
        .verify_credential(&credential, &ValidationOptions::default())
        .await;
    assert!(result.is_valid);

    engine
        .issuance
        .revoke_credential(&credential.id, Some("superseded".into()))
        .await
        .unwrap();

    let result = engine
        .issuance
        .verify_credential(&credential, &ValidationOptions::default())
        .await;
    assert!(!result.is_valid);
    assert!(result.has_error(IssueCode::Revoked));
}

#[tokio::test]
async fn test_serialized_credential_still_verifies() {
    let engine = engine();
    let credential = engine
        .issuance
        .issue_credential(&diploma_request(ISSUER, SUBJECT), None)
        .await
        .unwrap();

    let json = serde_json::to_string(&credential).unwrap();
    let result = engine
        .validator
        .validate(&json, &ValidationOptions::default())
        .await;
    assert!(result.is_valid, "errors: {:?}", result.errors);
    assert_eq!(result.credential_id.as_deref(), Some(credential.id.as_str()));
    assert_eq!(result.claims["degree"], "BSc");
}

#[tokio::test]
async fn test_trusted_issuer_config() {
    let engine = TestEngine::with_config(EngineConfig {
        trusted_issuers: vec!["did:example:other".into()],
        ..Default::default()
    });
    engine.register_participant(ISSUER);
    engine.register_participant(SUBJECT);

    let credential = engine
        .issuance
        .issue_credential(&diploma_request(ISSUER, SUBJECT), None)
        .await
        .unwrap();

    // Absence from the trust list warns but does not invalidate.
    let options = ValidationOptions {
        trusted_issuers: vec!["did:example:other".into()],
        ..Default::default()
    };
    let result = engine.issuance.verify_credential(&credential, &options).await;
    assert!(result.is_valid);
    assert!(result.has_warning(IssueCode::UntrustedIssuer));
}

#[tokio::test]
async fn test_every_outcome_is_audited() {
    let engine = engine();
    engine
        .issuance
        .issue_credential(&diploma_request(ISSUER, SUBJECT), None)
        .await
        .unwrap();

    let mut bad = diploma_request(ISSUER, SUBJECT);
    bad.claims.clear();
    let _ = engine.issuance.issue_credential(&bad, None).await;

    let records = engine.audit.records();
    assert_eq!(records.len(), 2);
    // Correlation ids are distinct per operation.
    assert_ne!(records[0].correlation_id, records[1].correlation_id);
}
