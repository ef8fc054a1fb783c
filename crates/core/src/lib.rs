//! Paycore Core - Domain types
//!
//! This crate contains the fundamental types used across Paycore:
//! - `Amount`: Non-negative decimal wrapper for money fields
//! - `Currency`: Type-safe currency codes
//! - Status and type enums shared by the ledger, store, and services
//! - `TxMetadata`: Typed key-value metadata carried on transactions

pub mod amount;
pub mod currency;
pub mod metadata;
pub mod types;

pub use amount::{Amount, AmountError};
pub use currency::{Currency, CurrencyError};
pub use metadata::{MetadataKey, TxMetadata};
pub use types::{
    AdjustmentDirection, FraudReportStatus, RiskLevel, RiskRecommendation, TransactionStatus,
    TransactionType, WalletStatus,
};
