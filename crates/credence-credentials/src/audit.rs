use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// One terminal credential operation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Operation name (e.g., "credential.issue", "credential.revoke").
    pub event_type: String,
    /// Coarse category ("issuance", "revocation", "verification").
    pub category: String,
    pub outcome: AuditOutcome,
    /// Subject DID or credential id the operation concerned.
    pub subject_id: Option<String>,
    /// Correlates all records of one logical operation.
    pub correlation_id: String,
    pub metadata: Map<String, Value>,
    pub at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        event_type: impl Into<String>,
        category: impl Into<String>,
        outcome: AuditOutcome,
        subject_id: Option<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            category: category.into(),
            outcome,
            subject_id,
            correlation_id: correlation_id.into(),
            metadata: Map::new(),
            at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Receives every terminal operation outcome, success and failure alike.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord);
}

/// Audit sink that emits structured log events.
#[derive(Default)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: AuditRecord) {
        match record.outcome {
            AuditOutcome::Success => info!(
                event = %record.event_type,
                category = %record.category,
                subject = record.subject_id.as_deref().unwrap_or("-"),
                correlation_id = %record.correlation_id,
                "audit"
            ),
            AuditOutcome::Failure => warn!(
                event = %record.event_type,
                category = %record.category,
                subject = record.subject_id.as_deref().unwrap_or("-"),
                correlation_id = %record.correlation_id,
                "audit failure"
            ),
        }
    }
}

/// Audit sink that retains records, for tests and inspection.
#[derive(Default)]
pub struct InMemoryAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, record: AuditRecord) {
        if let Ok(mut records) = self.records.write() {
            records.push(record);
        }
    }
}
