use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProofError;

/// The five proof schemes the engine recognizes.
///
/// Serializes to the exact W3C suite identifier carried in a proof's
/// `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofScheme {
    #[serde(rename = "Ed25519Signature2020")]
    Ed25519Signature2020,
    #[serde(rename = "RsaSignature2018")]
    RsaSignature2018,
    #[serde(rename = "EcdsaSecp256k1Signature2019")]
    EcdsaSecp256k1Signature2019,
    #[serde(rename = "BbsBlsSignature2020")]
    BbsBlsSignature2020,
    #[serde(rename = "JsonWebSignature2020")]
    JsonWebSignature2020,
}

impl ProofScheme {
    pub const ALL: [ProofScheme; 5] = [
        ProofScheme::Ed25519Signature2020,
        ProofScheme::RsaSignature2018,
        ProofScheme::EcdsaSecp256k1Signature2019,
        ProofScheme::BbsBlsSignature2020,
        ProofScheme::JsonWebSignature2020,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProofScheme::Ed25519Signature2020 => "Ed25519Signature2020",
            ProofScheme::RsaSignature2018 => "RsaSignature2018",
            ProofScheme::EcdsaSecp256k1Signature2019 => "EcdsaSecp256k1Signature2019",
            ProofScheme::BbsBlsSignature2020 => "BbsBlsSignature2020",
            ProofScheme::JsonWebSignature2020 => "JsonWebSignature2020",
        }
    }

    /// Whether this scheme supports zero-knowledge selective disclosure.
    pub fn supports_zkp(&self) -> bool {
        matches!(self, ProofScheme::BbsBlsSignature2020)
    }
}

impl fmt::Display for ProofScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofScheme {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| ProofError::UnsupportedProofType(s.to_string()))
    }
}
