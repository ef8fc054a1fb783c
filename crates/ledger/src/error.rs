//! Ledger errors

use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Ledger entry amount cannot be zero")]
    ZeroAmount,

    #[error("transaction_id cannot be empty")]
    EmptyTransactionId,

    #[error("Stored decimal is not parseable: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
