//! Fundamental types, errors, and constants for the Credence credential
//! trust engine.

pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::CoreError;
pub use types::{new_correlation_id, Did};

/// Base JSON-LD context every credential and presentation carries.
pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// JSON-LD context marking a BBS+ / ZKP-capable document.
pub const BBS_V1_CONTEXT: &str = "https://w3id.org/security/bbs/v1";

/// Base type of every verifiable credential.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Base type of every verifiable presentation.
pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// Type marker added to ZKP-oriented presentations.
pub const BBS_SIGNATURE_TYPE: &str = "BbsBlsSignature2020";
