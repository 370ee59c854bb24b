//! Credence Identity Layer
//!
//! Decentralized identity primitives for the trust engine:
//! - W3C-compatible DID Documents with named verification relationships
//! - Deterministic verification-method lookup
//! - DID resolution (in-memory, composite)

pub mod document;
pub mod error;
pub mod resolver;

pub use document::{
    find_verification_method, primary_verification_method, DidDocument, VerificationMethod,
    VerificationMethodRef, VerificationRelationship,
};
pub use error::IdentityError;
pub use resolver::{CompositeDidResolver, DidResolver, InMemoryDidResolver};
