use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::CredentialError;
use crate::model::VerifiableCredential;

/// Keyed store for issued credentials. Implementations must tolerate
/// concurrent callers; per-id operations are atomic.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Store a new credential. Duplicate ids are rejected.
    async fn insert(&self, credential: VerifiableCredential) -> Result<(), CredentialError>;

    /// Replace a stored credential. Unknown ids are rejected.
    async fn update(&self, credential: VerifiableCredential) -> Result<(), CredentialError>;

    async fn get(&self, id: &str) -> Result<Option<VerifiableCredential>, CredentialError>;

    async fn by_issuer(&self, issuer: &str) -> Result<Vec<VerifiableCredential>, CredentialError>;

    async fn by_subject(&self, subject: &str)
        -> Result<Vec<VerifiableCredential>, CredentialError>;

    async fn count(&self) -> Result<usize, CredentialError>;
}

/// Repository backed by a concurrent in-memory map.
#[derive(Default)]
pub struct InMemoryCredentialRepository {
    credentials: DashMap<String, VerifiableCredential>,
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn insert(&self, credential: VerifiableCredential) -> Result<(), CredentialError> {
        match self.credentials.entry(credential.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(CredentialError::DuplicateCredential(credential.id))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(credential);
                Ok(())
            }
        }
    }

    async fn update(&self, credential: VerifiableCredential) -> Result<(), CredentialError> {
        match self.credentials.get_mut(&credential.id) {
            Some(mut entry) => {
                *entry = credential;
                Ok(())
            }
            None => Err(CredentialError::CredentialNotFound(credential.id)),
        }
    }

    async fn get(&self, id: &str) -> Result<Option<VerifiableCredential>, CredentialError> {
        Ok(self.credentials.get(id).map(|entry| entry.clone()))
    }

    async fn by_issuer(&self, issuer: &str) -> Result<Vec<VerifiableCredential>, CredentialError> {
        Ok(self
            .credentials
            .iter()
            .filter(|entry| entry.issuer == issuer)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn by_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<VerifiableCredential>, CredentialError> {
        Ok(self
            .credentials
            .iter()
            .filter(|entry| entry.subject_id() == Some(subject))
            .map(|entry| entry.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize, CredentialError> {
        Ok(self.credentials.len())
    }
}
