//! Audit record shape

use chrono::{DateTime, Utc};
use paycore_core::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// What happened
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Risk engine blocked the movement; nothing was persisted in the ledger
    RiskBlocked,
    /// Transaction persisted but funds held pending review
    TransactionHeld,
    /// Manual balance adjustment by an operator
    BalanceAdjusted,
}

/// One line in the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: AuditAction,
    /// Idempotency reference of the movement, when one exists
    pub reference: Option<String>,
    pub initiator_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: Currency,
    /// Action-specific context: risk scores and flags, adjustment reasons
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        initiator_id: impl Into<String>,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            action,
            reference: None,
            initiator_id: initiator_id.into(),
            amount,
            currency,
            details: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
