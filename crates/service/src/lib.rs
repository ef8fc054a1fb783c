//! Paycore Service - the transaction orchestration layer
//!
//! Every money movement follows the same template: validate, assess risk
//! (a blocking precondition, never fire-and-forget), then one unit of work
//! that mutates wallets, writes the transaction row, appends ledger
//! entries, and files a fraud report when the score calls for one. Audit
//! records for blocked, held and adjusted movements are written after
//! commit.

pub mod adjustment;
pub mod config;
pub mod conversion;
pub mod error;
pub mod query;
pub mod rate;
pub mod transfer;

pub use adjustment::AdjustmentRequest;
pub use config::{HeldFundsPolicy, ServiceConfig};
pub use conversion::ConversionRequest;
pub use error::{ServiceError, ServiceResult};
pub use rate::{FixedRateLookup, RateLookup};
pub use transfer::{TransactionService, TransferRequest};
