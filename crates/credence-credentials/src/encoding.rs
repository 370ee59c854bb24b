use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CredentialError;
use crate::model::CredentialStatus;

/// The two credential encodings the engine accepts.
#[derive(Debug, Clone)]
pub enum CredentialEncoding {
    /// Three-segment signed compact token.
    CompactToken(String),
    /// Parsed structured (Linked-Data-Proof) document.
    StructuredDocument(Value),
}

/// Classify an input as a compact token or a structured document.
///
/// A token is exactly three non-empty dot-separated segments that do not
/// form a JSON object. Anything else must parse as JSON.
pub fn classify(input: &str) -> Result<CredentialEncoding, CredentialError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CredentialError::Validation("empty credential input".into()));
    }
    if !trimmed.starts_with('{') {
        let segments: Vec<&str> = trimmed.split('.').collect();
        if segments.len() == 3 && segments.iter().all(|s| !s.is_empty()) {
            return Ok(CredentialEncoding::CompactToken(trimmed.to_string()));
        }
    }
    let doc: Value = serde_json::from_str(trimmed).map_err(|e| {
        CredentialError::Validation(format!("neither compact token nor JSON document: {}", e))
    })?;
    Ok(CredentialEncoding::StructuredDocument(doc))
}

/// Compact token header. `kid` names the verification method the
/// signature was produced under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
    pub kid: String,
}

impl TokenHeader {
    pub fn new(alg: impl Into<String>, kid: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            typ: "JWT".into(),
            kid: kid.into(),
        }
    }
}

/// Compact token payload claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer DID.
    pub iss: String,
    /// Subject DID.
    pub sub: String,
    /// Credential identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Not-before, seconds since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Credential type carried in the token.
    #[serde(
        rename = "credentialType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credential_type: Option<String>,
    /// Anti-replay challenge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Status descriptor, when the credential is status-tracked.
    #[serde(
        rename = "credentialStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credential_status: Option<CredentialStatus>,
    /// Custom claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|s| Utc.timestamp_opt(s, 0).single())
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.nbf.and_then(|s| Utc.timestamp_opt(s, 0).single())
    }
}

/// A decoded compact token. Claims are untrusted until the signature over
/// `signing_input` has been verified.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: TokenHeader,
    pub claims: TokenClaims,
    pub signature: Vec<u8>,
    /// The first two segments, exactly as signed.
    pub signing_input: String,
}

/// Serialize header and claims into the unsigned two-segment form.
pub fn encode_signing_input(
    header: &TokenHeader,
    claims: &TokenClaims,
) -> Result<String, CredentialError> {
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?);
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{}.{}", header_b64, claims_b64))
}

/// Append a signature to the signing input, producing the full token.
pub fn attach_signature(signing_input: &str, signature: &[u8]) -> String {
    format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
}

/// Decode a compact token without verifying the signature.
pub fn decode_token(token: &str) -> Result<DecodedToken, CredentialError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(CredentialError::Validation(format!(
            "compact token must have 3 segments, got {}",
            segments.len()
        )));
    }
    let decode_segment = |segment: &str, what: &str| {
        URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
            CredentialError::Validation(format!("invalid base64 in token {}: {}", what, e))
        })
    };
    let header: TokenHeader = serde_json::from_slice(&decode_segment(segments[0], "header")?)?;
    let claims: TokenClaims = serde_json::from_slice(&decode_segment(segments[1], "claims")?)?;
    let signature = decode_segment(segments[2], "signature")?;
    Ok(DecodedToken {
        header,
        claims,
        signature,
        signing_input: format!("{}.{}", segments[0], segments[1]),
    })
}
