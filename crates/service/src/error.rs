//! Service-level error taxonomy

use paycore_core::Currency;
use paycore_ledger::LedgerError;
use paycore_risk::RiskError;
use paycore_store::StoreError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced to callers of the transaction service.
///
/// `RiskBlocked` carries only the combined score; the contributing
/// factors stay in the internal audit trail and fraud reports.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        available: Decimal,
        required: Decimal,
    },

    #[error("Currency mismatch: {from} -> {to}")]
    CurrencyMismatch { from: Currency, to: Currency },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Transaction blocked by risk policy (score {score})")]
    RiskBlocked { score: u8 },

    #[error("No exchange rate available for {from} -> {to}")]
    RateUnavailable { from: Currency, to: Currency },

    #[error("Risk assessment failed: {0}")]
    Risk(#[from] RiskError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => {
                ServiceError::NotFound(format!("{} {}", entity, id))
            }
            StoreError::InsufficientFunds {
                available, required, ..
            } => ServiceError::InsufficientFunds {
                available,
                required,
            },
            StoreError::TerminalStatus { id, status } => {
                ServiceError::InvalidState(format!("transaction {} already resolved as {}", id, status))
            }
            other => ServiceError::Store(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Store(StoreError::Database(e))
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
