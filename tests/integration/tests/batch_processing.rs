//! Batch issuance, revocation, and verification with partial failures.

use credence_credentials::{BatchOptions, ValidationOptions};
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
async fn test_partial_failure_with_continue_on_error() {
    let engine = engine();
    let mut requests = Vec::new();
    for i in 0..5 {
        let mut request = diploma_request(ISSUER, SUBJECT);
        if i % 2 == 1 {
            request.subject = "".into();
        }
        requests.push(request);
    }

    let result = engine
        .issuance
        .issue_credentials_batch(
            requests,
            &BatchOptions {
                continue_on_error: true,
                default_proof_scheme: None,
            },
        )
        .await;
    assert_eq!(result.success_count(), 3);
    assert_eq!(result.error_count(), 2);
    assert!(result.is_success());
    // Failed items carry the original request and a typed code.
    assert!(result.errors.iter().all(|e| e.request.subject.is_empty()));
    assert!(result.errors.iter().all(|e| e.code == "ValidationError"));
}

#[tokio::test]
async fn test_stop_at_first_failure() {
    let engine = engine();
    let mut bad = diploma_request(ISSUER, SUBJECT);
    bad.subject = "".into();
    let requests = vec![
        diploma_request(ISSUER, SUBJECT),
        bad,
        diploma_request(ISSUER, SUBJECT),
    ];

    let result = engine
        .issuance
        .issue_credentials_batch(requests, &BatchOptions::default())
        .await;
    assert_eq!(result.success_count(), 1);
    assert_eq!(result.error_count(), 1);
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_all_failures_never_succeed() {
    let engine = engine();
    let mut bad = diploma_request(ISSUER, SUBJECT);
    bad.subject = "".into();

    let result = engine
        .issuance
        .issue_credentials_batch(
            vec![bad.clone(), bad],
            &BatchOptions {
                continue_on_error: true,
                default_proof_scheme: None,
            },
        )
        .await;
    assert_eq!(result.success_count(), 0);
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_batch_default_scheme() {
    let engine = engine();
    let mut with_override = diploma_request(ISSUER, SUBJECT);
    with_override.proof_scheme = Some(ProofScheme::Ed25519Signature2020);

    let result = engine
        .issuance
        .issue_credentials_batch(
            vec![diploma_request(ISSUER, SUBJECT), with_override],
            &BatchOptions {
                continue_on_error: false,
                default_proof_scheme: Some(ProofScheme::RsaSignature2018),
            },
        )
        .await;
    assert_eq!(result.success_count(), 2);
    // First request picks up the batch default, the second keeps its own.
    let schemes: Vec<ProofScheme> = result
        .successes
        .iter()
        .map(|vc| vc.proof.clone().unwrap().scheme().unwrap())
        .collect();
    assert_eq!(
        schemes,
        vec![
            ProofScheme::RsaSignature2018,
            ProofScheme::Ed25519Signature2020
        ]
    );
}

#[tokio::test]
async fn test_batch_revocation() {
    let engine = engine();
    let mut request = diploma_request(ISSUER, SUBJECT);
    request.with_status = true;
    let issued = engine
        .issuance
        .issue_credentials_batch(
            vec![request.clone(), request],
            &BatchOptions {
                continue_on_error: true,
                default_proof_scheme: None,
            },
        )
        .await;
    let mut ids: Vec<String> = issued.successes.iter().map(|vc| vc.id.clone()).collect();
    ids.push("urn:uuid:missing".into());

    let result = engine
        .issuance
        .revoke_credentials_batch(
            ids,
            &BatchOptions {
                continue_on_error: true,
                default_proof_scheme: None,
            },
        )
        .await;
    assert_eq!(result.success_count(), 2);
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.errors[0].code, "CredentialNotFound");
    assert!(result.is_success());
}

#[tokio::test]
async fn test_batch_verification_counts() {
    let engine = engine();
    let issued = engine
        .issuance
        .issue_credentials_batch(
            vec![
                diploma_request(ISSUER, SUBJECT),
                diploma_request(ISSUER, SUBJECT),
            ],
            &BatchOptions {
                continue_on_error: true,
                default_proof_scheme: None,
            },
        )
        .await;

    let mut credentials = issued.successes.clone();
    credentials[1]
        .credential_subject
        .insert("degree".into(), serde_json::json!("PhD"));

    let batch = engine
        .issuance
        .verify_credentials_batch(&credentials, &ValidationOptions::default())
        .await;
    assert_eq!(batch.valid_count(), 1);
    assert_eq!(batch.invalid_count(), 1);
}
