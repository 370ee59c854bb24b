use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use credence_core::types::Did;

use crate::document::DidDocument;
use crate::error::IdentityError;

/// Resolves a DID to its DID Document.
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError>;
}

/// Resolver backed by a concurrent in-memory registry.
///
/// Intended for tests and for deployments where the set of participating
/// DIDs is provisioned up front.
#[derive(Default)]
pub struct InMemoryDidResolver {
    documents: DashMap<String, DidDocument>,
}

impl InMemoryDidResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document, replacing any existing one for the same DID.
    pub fn register(&self, doc: DidDocument) {
        debug!(did = %doc.id, "registering DID document");
        self.documents.insert(doc.id.clone(), doc);
    }

    pub fn remove(&self, did: &str) -> bool {
        self.documents.remove(did).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DidResolver for InMemoryDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        // Reject malformed identifiers before hitting the registry.
        Did::new(did)?;
        self.documents
            .get(did)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| IdentityError::DidNotFound(did.to_string()))
    }
}

/// Tries a list of resolvers in order, returning the first success.
pub struct CompositeDidResolver {
    resolvers: Vec<Arc<dyn DidResolver>>,
}

impl CompositeDidResolver {
    pub fn new(resolvers: Vec<Arc<dyn DidResolver>>) -> Self {
        Self { resolvers }
    }
}

#[async_trait]
impl DidResolver for CompositeDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, IdentityError> {
        for resolver in &self.resolvers {
            match resolver.resolve(did).await {
                Ok(doc) => return Ok(doc),
                Err(err) => {
                    debug!(did, error = %err, "resolver miss, trying next");
                }
            }
        }
        Err(IdentityError::DidNotFound(did.to_string()))
    }
}
