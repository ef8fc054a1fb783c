//! Risk aggregator
//!
//! Combines the AML rule checker and the fraud engine into the single
//! assessment the Transaction Service acts on.

use paycore_core::{RiskLevel, RiskRecommendation};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::config::RiskConfig;
use crate::error::RiskError;
use crate::types::{
    AmlOutcome, FraudOutcome, InitiatorHistory, ProposedTransfer, RiskAssessment,
};
use crate::{aml, fraud};

// Combined-score breakpoints
const BLOCK_AT: u8 = 90;
const HOLD_AT: u8 = 70;
const FLAG_AT: u8 = 40;

/// Numeric weight of the AML risk level in the combined score
fn aml_numeric_score(level: RiskLevel) -> u8 {
    match level {
        RiskLevel::Critical => 100,
        RiskLevel::High => 75,
        RiskLevel::Medium => 50,
        RiskLevel::Low => 10,
    }
}

/// Combine the two sub-results: `round(aml * 0.4 + fraud * 0.6)`.
///
/// Flags keep their order: AML flag names first, fraud reasons after.
pub fn combine(aml_outcome: &AmlOutcome, fraud_outcome: &FraudOutcome) -> RiskAssessment {
    let aml_score = Decimal::from(aml_numeric_score(aml_outcome.level));
    let fraud_score = Decimal::from(fraud_outcome.score);

    let combined = aml_score * Decimal::new(4, 1) + fraud_score * Decimal::new(6, 1);
    let score = combined.round().to_u8().unwrap_or(100).min(100);

    let (level, recommendation) = if score >= BLOCK_AT {
        (RiskLevel::Critical, RiskRecommendation::Block)
    } else if score >= HOLD_AT {
        (RiskLevel::High, RiskRecommendation::Hold)
    } else if score >= FLAG_AT {
        (RiskLevel::Medium, RiskRecommendation::Flag)
    } else {
        (RiskLevel::Low, RiskRecommendation::Allow)
    };

    let mut flags: Vec<String> = aml_outcome.flags.iter().map(|f| f.to_string()).collect();
    flags.extend(fraud_outcome.reasons.iter().cloned());

    RiskAssessment {
        score,
        level,
        flags,
        recommendation,
    }
}

/// Risk scorer - fetches the initiator snapshot and runs both checks.
pub struct RiskScorer {
    config: RiskConfig,
    history: Arc<dyn InitiatorHistory>,
}

impl RiskScorer {
    pub fn new(config: RiskConfig, history: Arc<dyn InitiatorHistory>) -> Self {
        Self { config, history }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Assess one proposed movement.
    ///
    /// The snapshot is read once; AML and fraud checks then run concurrently
    /// since both are read-only over the same snapshot. The assessment must
    /// complete before any wallet mutation begins - the caller treats it as
    /// a blocking precondition.
    pub async fn assess(&self, proposed: &ProposedTransfer) -> Result<RiskAssessment, RiskError> {
        let snapshot = self
            .history
            .snapshot(&proposed.initiator_id, proposed.timestamp)
            .await?;

        let (aml_outcome, fraud_outcome) = tokio::join!(
            async { aml::check(&self.config, proposed, &snapshot) },
            async { fraud::score(&self.config, proposed, &snapshot) },
        );

        let assessment = combine(&aml_outcome, &fraud_outcome);

        if assessment.recommendation != RiskRecommendation::Allow {
            tracing::info!(
                initiator = %proposed.initiator_id,
                score = assessment.score,
                recommendation = %assessment.recommendation,
                "risk assessment above allow threshold"
            );
        }

        Ok(assessment)
    }
}
