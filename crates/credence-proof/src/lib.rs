//! Cryptographic proof layer for the Credence trust engine.
//!
//! A [`ProofService`] creates and verifies one proof scheme over a
//! canonicalized JSON document, delegating all key operations to an injected
//! [`KeyProvider`]. The [`ProofServiceFactory`] maps a declared scheme to a
//! concrete service and rejects unknown schemes.

pub mod error;
pub mod factory;
pub mod key_provider;
pub mod model;
pub mod scheme;
pub mod service;

pub use error::ProofError;
pub use factory::ProofServiceFactory;
pub use key_provider::{InMemoryKeyProvider, KeyHandle, KeyProvider};
pub use model::{canonical_json, Proof, ProofPurpose, ProofRepresentation};
pub use scheme::ProofScheme;
pub use service::{Ed25519ProofService, ProofService, RsaProofService, UnimplementedProofService};
