//! Store errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from the persistence adapter
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Insufficient funds in wallet {wallet_id}: available {available}, required {required}")]
    InsufficientFunds {
        wallet_id: String,
        available: Decimal,
        required: Decimal,
    },

    #[error("Duplicate transaction reference: {0}")]
    DuplicateReference(String),

    #[error("Transaction {id} is already resolved as {status}")]
    TerminalStatus { id: String, status: String },

    #[error("Stored value is not parseable: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
