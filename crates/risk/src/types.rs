//! Risk scoring types and the history seam

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paycore_core::{Currency, RiskLevel, RiskRecommendation, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::RiskError;

/// The proposed money movement being scored
#[derive(Debug, Clone)]
pub struct ProposedTransfer {
    pub initiator_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub tx_type: TransactionType,
    /// Evaluation timestamp; injected so the off-hours factor is testable
    pub timestamp: DateTime<Utc>,
}

impl ProposedTransfer {
    pub fn new(
        initiator_id: impl Into<String>,
        amount: Decimal,
        currency: Currency,
        tx_type: TransactionType,
    ) -> Self {
        Self {
            initiator_id: initiator_id.into(),
            amount,
            currency,
            tx_type,
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Pre-fetched view of an initiator's history, read once per assessment.
///
/// Both sub-checks consume the same snapshot so they stay pure functions.
#[derive(Debug, Clone, Default)]
pub struct InitiatorSnapshot {
    pub account_age_days: i64,
    pub verified: bool,
    /// Transactions by this initiator in the trailing hour
    pub tx_count_last_hour: u32,
    /// Volume moved by this initiator since midnight UTC
    pub volume_today: Decimal,
    /// Completed transactions over all time
    pub completed_count: u64,
    /// Average amount over completed transactions, when any exist
    pub avg_completed_amount: Option<Decimal>,
    /// Failed authentication attempts in the recent window
    pub failed_auth_recent: u32,
}

/// Read-only seam to historical data, implemented by the store.
#[async_trait]
pub trait InitiatorHistory: Send + Sync {
    async fn snapshot(
        &self,
        initiator_id: &str,
        at: DateTime<Utc>,
    ) -> Result<InitiatorSnapshot, RiskError>;
}

/// Named AML flags, one per triggered rule
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFlag {
    HighValueAmount,
    HighVelocity,
    DailyCapExceeded,
    NewAccountHighAmount,
    UnverifiedIdentity,
}

/// Result of the AML rule checker
#[derive(Debug, Clone, PartialEq)]
pub struct AmlOutcome {
    pub flags: Vec<RiskFlag>,
    pub level: RiskLevel,
}

/// Result of the fraud engine
#[derive(Debug, Clone, PartialEq)]
pub struct FraudOutcome {
    /// Clamped to [0, 100]
    pub score: u8,
    /// One human-readable reason per triggered factor
    pub reasons: Vec<String>,
}

/// The combined assessment the Transaction Service acts on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Combined score, 0-100
    pub score: u8,
    pub level: RiskLevel,
    /// Ordered contributing flags: AML flag names first, fraud reasons after
    pub flags: Vec<String>,
    pub recommendation: RiskRecommendation,
}

impl RiskAssessment {
    /// Fail-safe assessment used when the scoring call times out.
    ///
    /// A risk-check timeout must never be treated as ALLOW.
    pub fn timed_out() -> Self {
        Self {
            score: 75,
            level: RiskLevel::High,
            flags: vec!["RISK_CHECK_TIMEOUT".to_string()],
            recommendation: RiskRecommendation::Hold,
        }
    }

    /// Whether the caller must persist a fraud report for this assessment
    pub fn requires_fraud_report(&self) -> bool {
        self.recommendation != RiskRecommendation::Allow
    }

    /// Whether the movement may proceed at all
    pub fn is_blocked(&self) -> bool {
        self.recommendation == RiskRecommendation::Block
    }
}
