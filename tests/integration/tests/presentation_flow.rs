//! Holder-to-verifier presentation flows: full, selective disclosure,
//! challenge-bound, and domain-bound.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde_json::json;

use credence_credentials::IssueCode;
use credence_integration_tests::{claims, TestEngine};
use credence_credentials::IssueRequest;
use credence_presentation::{PresentationOptions, PresentationValidationOptions};

const ISSUER: &str = "did:example:issuer1";
const HOLDER: &str = "did:example:holder1";

fn engine() -> TestEngine {
    let engine = TestEngine::new();
    engine.register_participant(ISSUER);
    engine.register_participant(HOLDER);
    engine
}

fn diploma_for_holder() -> IssueRequest {
    IssueRequest::new(
        ISSUER,
        HOLDER,
        "DiplomaCredential",
        claims(&[
            ("degree", json!("BSc")),
            ("institution", json!("Example University")),
            ("gpa", json!("3.9")),
        ]),
    )
}

#[tokio::test]
async fn test_present_and_validate() {
    let engine = engine();
    let credential = engine
        .issuance
        .issue_credential(&diploma_for_holder(), None)
        .await
        .unwrap();

    let vp = engine
        .presentations
        .create_presentation(HOLDER, vec![credential], &PresentationOptions::default())
        .await
        .unwrap();

    let result = engine
        .presentation_validator
        .validate_presentation(&vp, &PresentationValidationOptions::default())
        .await;
    assert!(result.is_valid, "errors: {:?}", result.errors);
    assert_eq!(result.claims["credential_0_degree"], "BSc");
    assert_eq!(result.claims["credential_0_issuer"], ISSUER);
}

#[tokio::test]
async fn test_selective_disclosure_leaks_nothing() {
    let engine = engine();
    let credential = engine
        .issuance
        .issue_credential(&diploma_for_holder(), None)
        .await
        .unwrap();
    let credential_id = credential.id.clone();

    let mut disclosures = HashMap::new();
    disclosures.insert(credential_id, vec!["degree".to_string()]);

    let vp = engine
        .presentations
        .create_selective_disclosure_presentation(
            HOLDER,
            vec![credential],
            &disclosures,
            false,
            &PresentationOptions::default(),
        )
        .await
        .unwrap();

    // Nothing but the subject id and the disclosed claim crosses the wire.
    let wire = serde_json::to_string(&vp).unwrap();
    assert!(wire.contains("degree"));
    assert!(!wire.contains("institution"));
    assert!(!wire.contains("3.9"));

    let derived = &vp.verifiable_credential[0];
    assert_eq!(derived.credential_subject.len(), 2);
    assert!(derived.credential_subject.contains_key("id"));
    assert!(derived.credential_subject.contains_key("degree"));

    // The derived presentation still validates.
    let result = engine
        .presentation_validator
        .validate_presentation(&vp, &PresentationValidationOptions::default())
        .await;
    assert!(result.is_valid, "errors: {:?}", result.errors);
}

#[tokio::test]
async fn test_challenge_round_trip_and_mismatch() {
    let engine = engine();
    let credential = engine
        .issuance
        .issue_credential(&diploma_for_holder(), None)
        .await
        .unwrap();

    let vp = engine
        .presentations
        .create_challenge_response_presentation(
            HOLDER,
            vec![credential],
            "verifier-nonce-1",
            Some(Utc::now() + Duration::minutes(10)),
            &PresentationOptions::default(),
        )
        .await
        .unwrap();

    // Matching expectation passes.
    let result = engine
        .presentation_validator
        .validate_presentation(
            &vp,
            &PresentationValidationOptions {
                expected_challenge: Some("verifier-nonce-1".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(result.is_valid, "errors: {:?}", result.errors);

    // Different expectation fails even though the proof verifies.
    let result = engine
        .presentation_validator
        .validate_presentation(
            &vp,
            &PresentationValidationOptions {
                expected_challenge: Some("verifier-nonce-2".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(!result.is_valid);
    assert!(result.has_error(IssueCode::ChallengeMismatch));
    assert!(!result.has_error(IssueCode::ProofVerification));
}

#[tokio::test]
async fn test_domain_bound_presentation() {
    let engine = TestEngine::new();
    engine.register_participant(ISSUER);
    engine.register_participant("did:web:wallet.example.com");

    let request = IssueRequest::new(
        ISSUER,
        "did:web:wallet.example.com",
        "DiplomaCredential",
        claims(&[("degree", json!("BSc"))]),
    );
    let credential = engine.issuance.issue_credential(&request, None).await.unwrap();

    let vp = engine
        .presentations
        .create_domain_bound_presentation(
            "did:web:wallet.example.com",
            vec![credential.clone()],
            "WALLET.EXAMPLE.COM",
            true,
            &PresentationOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(vp.domain.as_deref(), Some("WALLET.EXAMPLE.COM"));

    let result = engine
        .presentation_validator
        .validate_presentation(
            &vp,
            &PresentationValidationOptions {
                expected_domain: Some("WALLET.EXAMPLE.COM".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(result.is_valid, "errors: {:?}", result.errors);

    // Ownership check rejects a foreign domain outright.
    let err = engine
        .presentations
        .create_domain_bound_presentation(
            "did:web:wallet.example.com",
            vec![credential],
            "evil.example.org",
            true,
            &PresentationOptions::default(),
        )
        .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_revoked_credential_invalidates_presentation() {
    let engine = engine();
    let mut request = diploma_for_holder();
    request.with_status = true;
    let credential = engine
        .issuance
        .issue_credential(&request, None)
        .await
        .unwrap();

    let vp = engine
        .presentations
        .create_presentation(HOLDER, vec![credential.clone()], &PresentationOptions::default())
        .await
        .unwrap();

    engine
        .issuance
        .revoke_credential(&credential.id, None)
        .await
        .unwrap();

    let result = engine
        .presentation_validator
        .validate_presentation(&vp, &PresentationValidationOptions::default())
        .await;
    assert!(!result.is_valid);
    assert!(result.has_error(IssueCode::Revoked));
}

#[tokio::test]
async fn test_zkp_presentation_metadata_survives_validation() {
    let engine = engine();
    let credential = engine
        .issuance
        .issue_credential(&diploma_for_holder(), None)
        .await
        .unwrap();
    let credential_id = credential.id.clone();

    let mut disclosures = HashMap::new();
    disclosures.insert(credential_id.clone(), vec!["degree".to_string()]);

    let vp = engine
        .presentations
        .create_zkp_presentation(
            HOLDER,
            vec![credential],
            &disclosures,
            &PresentationOptions::default(),
        )
        .await
        .unwrap();
    assert!(vp
        .presentation_type
        .iter()
        .any(|t| t == "BbsBlsSignature2020"));
    assert_eq!(vp.metadata["revealedFields"][&credential_id], json!(["degree"]));
}
