//! Paycore Audit - append-only trail for sensitive actions
//!
//! Blocked and held transactions and every manual balance adjustment land
//! here as JSON lines, one file per day. Records are written after the
//! owning unit of work commits; the trail describes outcomes, not
//! attempts.

pub mod error;
pub mod jsonl;
pub mod record;
pub mod sink;

pub use error::AuditError;
pub use jsonl::JsonlAuditSink;
pub use record::{AuditAction, AuditRecord};
pub use sink::{AuditSink, MemoryAuditSink};
