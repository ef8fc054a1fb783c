//! Audit sink seam

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::AuditError;
use crate::record::AuditRecord;

/// Destination for audit records.
///
/// Callers invoke this after their unit of work commits; a sink failure
/// is logged by the caller and never rolls the movement back.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError>;
}

/// In-memory sink for tests
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}
