use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use crate::error::CredentialError;
use crate::model::{CredentialStatus, StatusPurpose};

/// Outcome of a status lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCheck {
    pub status_id: String,
    pub is_revoked: bool,
    pub is_suspended: bool,
    pub reason: Option<String>,
}

impl StatusCheck {
    fn clear(status_id: &str) -> Self {
        Self {
            status_id: status_id.to_string(),
            is_revoked: false,
            is_suspended: false,
            reason: None,
        }
    }
}

/// Owns revocation and suspension flags for issued credentials.
///
/// Status entries are append/flip-only: a revocation is permanent, a
/// suspension may be lifted. Unknown status ids read as active.
#[async_trait]
pub trait CredentialStatusService: Send + Sync {
    async fn check_status(&self, status_id: &str) -> Result<StatusCheck, CredentialError>;

    /// Flip one flag on a status entry. Clearing a revocation is rejected.
    async fn set_flag(
        &self,
        status_id: &str,
        purpose: StatusPurpose,
        flagged: bool,
        reason: Option<String>,
    ) -> Result<(), CredentialError>;

    async fn mark_revoked(
        &self,
        status_id: &str,
        reason: Option<String>,
    ) -> Result<(), CredentialError> {
        self.set_flag(status_id, StatusPurpose::Revocation, true, reason)
            .await
    }

    /// Active means neither revoked nor suspended.
    async fn is_active(&self, status: &CredentialStatus) -> Result<bool, CredentialError> {
        let check = self.check_status(&status.id).await?;
        Ok(!check.is_revoked && !check.is_suspended)
    }

    async fn check_status_batch(
        &self,
        status_ids: &[String],
    ) -> Result<Vec<StatusCheck>, CredentialError> {
        let mut checks = Vec::with_capacity(status_ids.len());
        for id in status_ids {
            checks.push(self.check_status(id).await?);
        }
        Ok(checks)
    }
}

#[derive(Debug, Clone, Default)]
struct StatusEntry {
    revoked: bool,
    suspended: bool,
    reason: Option<String>,
}

/// Status service backed by a concurrent in-memory table.
#[derive(Default)]
pub struct InMemoryStatusService {
    entries: DashMap<String, StatusEntry>,
}

impl InMemoryStatusService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStatusService for InMemoryStatusService {
    async fn check_status(&self, status_id: &str) -> Result<StatusCheck, CredentialError> {
        Ok(self
            .entries
            .get(status_id)
            .map(|entry| StatusCheck {
                status_id: status_id.to_string(),
                is_revoked: entry.revoked,
                is_suspended: entry.suspended,
                reason: entry.reason.clone(),
            })
            .unwrap_or_else(|| StatusCheck::clear(status_id)))
    }

    async fn set_flag(
        &self,
        status_id: &str,
        purpose: StatusPurpose,
        flagged: bool,
        reason: Option<String>,
    ) -> Result<(), CredentialError> {
        // The entry lock from the DashMap makes flag flips atomic per id.
        let mut entry = self.entries.entry(status_id.to_string()).or_default();
        match purpose {
            StatusPurpose::Revocation => {
                if entry.revoked && !flagged {
                    return Err(CredentialError::Validation(
                        "revocation cannot be cleared".into(),
                    ));
                }
                entry.revoked = flagged;
            }
            StatusPurpose::Suspension => entry.suspended = flagged,
        }
        if flagged {
            entry.reason = reason;
        }
        info!(status_id, ?purpose, flagged, "status flag updated");
        Ok(())
    }
}
