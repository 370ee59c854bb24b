//! Presentation layer of the Credence trust engine.
//!
//! Holders assemble verifiable presentations out of one or more
//! credentials: full, selectively disclosed, ZKP-oriented,
//! challenge-bound, or domain-bound. Verifiers validate them with the
//! same accumulated-result discipline as single credentials.

pub mod error;
pub mod model;
pub mod service;
pub mod validation;

pub use error::PresentationError;
pub use model::VerifiablePresentation;
pub use service::{derive_credential, PresentationOptions, PresentationService};
pub use validation::{
    extract_claims, PresentationBatchResult, PresentationValidationOptions,
    PresentationValidationResult, PresentationValidator,
};
