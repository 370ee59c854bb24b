//! Credential layer of the Credence trust engine.
//!
//! Covers the full credential lifecycle: issuance (single and batch),
//! format classification (compact token vs structured document),
//! verification with accumulated results, revocation and suspension via
//! the status service, schema validation, and audit logging.

pub mod audit;
pub mod batch;
pub mod encoding;
pub mod error;
pub mod issuance;
pub mod model;
pub mod schema;
pub mod status;
pub mod store;
pub mod validator;

pub use audit::{AuditOutcome, AuditRecord, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use batch::{BatchItemError, BatchOptions, BatchResult, BatchVerificationResult};
pub use encoding::{classify, CredentialEncoding, DecodedToken, TokenClaims, TokenHeader};
pub use error::CredentialError;
pub use issuance::{CredentialIssuanceService, IssueRequest};
pub use model::{CredentialStatus, StatusPurpose, VerifiableCredential};
pub use schema::{ClaimDefinition, CredentialSchema, SchemaRegistry, SchemaValidator};
pub use status::{CredentialStatusService, InMemoryStatusService, StatusCheck};
pub use store::{CredentialRepository, InMemoryCredentialRepository};
pub use validator::{
    CredentialValidator, IssueCode, ValidationIssue, ValidationOptions, ValidationResult,
};
