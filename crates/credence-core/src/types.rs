use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Decentralized Identifier. Format: `did:<method>:<method-specific-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Did(pub String);

impl Did {
    /// Create a DID from a full URI string, checking the basic shape.
    pub fn new(uri: impl Into<String>) -> Result<Self, CoreError> {
        let uri = uri.into();
        let parts: Vec<&str> = uri.split(':').collect();
        if parts.len() < 3 || parts[0] != "did" || parts[1].is_empty() || parts[2].is_empty() {
            return Err(CoreError::InvalidDid(format!(
                "DID must have format 'did:<method>:<identifier>', got: {}",
                uri
            )));
        }
        Ok(Self(uri))
    }

    /// Get the full DID URI.
    pub fn uri(&self) -> &str {
        &self.0
    }

    /// Extract the method (e.g. "web", "key", "example").
    pub fn method(&self) -> Option<&str> {
        self.0.split(':').nth(1)
    }

    /// Extract the method-specific identifier.
    pub fn method_specific_id(&self) -> Option<&str> {
        let parts: Vec<&str> = self.0.splitn(3, ':').collect();
        parts.get(2).copied()
    }

    /// For `did:web` DIDs, the domain embedded in the identifier
    /// (everything up to the first `:` of the method-specific id).
    pub fn web_domain(&self) -> Option<&str> {
        if self.method() != Some("web") {
            return None;
        }
        self.method_specific_id()
            .map(|id| id.split(':').next().unwrap_or(id))
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generate a fresh correlation id for audit trails.
pub fn new_correlation_id() -> String {
    Uuid::now_v7().to_string()
}
