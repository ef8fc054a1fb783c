//! Fraud engine - additive anomaly scoring
//!
//! Computes a 0-100 score from weighted factors. Each factor is additive
//! and independent; each triggered factor yields one human-readable reason.

use chrono::Timelike;
use rust_decimal::Decimal;

use crate::config::RiskConfig;
use crate::types::{FraudOutcome, InitiatorSnapshot, ProposedTransfer};

// Factor weights
const W_AMOUNT_VS_AVERAGE: u32 = 25;
const W_VELOCITY: u32 = 20;
const W_OFF_HOURS: u32 = 10;
const W_NEW_ACCOUNT: u32 = 15;
const W_UNVERIFIED: u32 = 10;
const W_FAILED_AUTH: u32 = 10;
const W_LARGE_AMOUNT: u32 = 15;
const W_MEDIUM_AMOUNT: u32 = 8;

/// Score one proposed transaction.
///
/// Pure function: all historical inputs come through the snapshot.
pub fn score(
    config: &RiskConfig,
    proposed: &ProposedTransfer,
    snapshot: &InitiatorSnapshot,
) -> FraudOutcome {
    let mut total: u32 = 0;
    let mut reasons = Vec::new();

    // Amount far above the initiator's historical average. Only meaningful
    // with enough history behind the average.
    if snapshot.completed_count >= config.fraud_min_history {
        if let Some(avg) = snapshot.avg_completed_amount {
            if avg > Decimal::ZERO && proposed.amount > avg * config.fraud_avg_multiplier {
                total += W_AMOUNT_VS_AVERAGE;
                reasons.push(format!(
                    "Amount {} exceeds {}x historical average {}",
                    proposed.amount, config.fraud_avg_multiplier, avg
                ));
            }
        }
    }

    // Burst of activity in the trailing hour
    if snapshot.tx_count_last_hour > config.fraud_velocity_per_hour {
        total += W_VELOCITY;
        reasons.push(format!(
            "{} transactions in the last hour (limit {})",
            snapshot.tx_count_last_hour, config.fraud_velocity_per_hour
        ));
    }

    // Fixed off-hours window
    let hour = proposed.timestamp.hour();
    if hour >= config.off_hours_start && hour < config.off_hours_end {
        total += W_OFF_HOURS;
        reasons.push(format!("Initiated during off-hours ({:02}:00 UTC)", hour));
    }

    // Very young account
    if snapshot.account_age_days < config.fraud_new_account_days {
        total += W_NEW_ACCOUNT;
        reasons.push(format!(
            "Account is {} days old",
            snapshot.account_age_days
        ));
    }

    // Unverified identity
    if !snapshot.verified {
        total += W_UNVERIFIED;
        reasons.push("Identity not verified".to_string());
    }

    // Repeated failed authentication attempts
    if snapshot.failed_auth_recent > config.fraud_failed_auth_threshold {
        total += W_FAILED_AUTH;
        reasons.push(format!(
            "{} recent failed authentication attempts",
            snapshot.failed_auth_recent
        ));
    }

    // Absolute amount tiers; the larger tier wins
    if proposed.amount > config.fraud_large_amount {
        total += W_LARGE_AMOUNT;
        reasons.push(format!(
            "Amount {} above {}",
            proposed.amount, config.fraud_large_amount
        ));
    } else if proposed.amount > config.fraud_medium_amount {
        total += W_MEDIUM_AMOUNT;
        reasons.push(format!(
            "Amount {} above {}",
            proposed.amount, config.fraud_medium_amount
        ));
    }

    FraudOutcome {
        score: total.min(100) as u8,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use paycore_core::{Currency, TransactionType};
    use rust_decimal_macros::dec;

    fn proposed_at_noon(amount: Decimal) -> ProposedTransfer {
        ProposedTransfer::new("user-1", amount, Currency::Usd, TransactionType::Transfer)
            .at(Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap())
    }

    fn clean_snapshot() -> InitiatorSnapshot {
        InitiatorSnapshot {
            account_age_days: 365,
            verified: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_transaction_scores_zero() {
        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(100)), &clean_snapshot());
        assert_eq!(outcome.score, 0);
        assert!(outcome.reasons.is_empty());
    }

    #[test]
    fn test_average_factor_needs_history() {
        let mut snapshot = clean_snapshot();
        snapshot.avg_completed_amount = Some(dec!(100));
        snapshot.completed_count = 5; // below minimum history

        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(1000)), &snapshot);
        assert_eq!(outcome.score, 0);

        snapshot.completed_count = 6;
        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(1000)), &snapshot);
        assert_eq!(outcome.score, W_AMOUNT_VS_AVERAGE as u8);
        assert_eq!(outcome.reasons.len(), 1);
    }

    #[test]
    fn test_velocity_factor() {
        let mut snapshot = clean_snapshot();
        snapshot.tx_count_last_hour = 6;
        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(100)), &snapshot);
        assert_eq!(outcome.score, W_VELOCITY as u8);
    }

    #[test]
    fn test_off_hours_factor() {
        let at_3am = ProposedTransfer::new(
            "user-1",
            dec!(100),
            Currency::Usd,
            TransactionType::Transfer,
        )
        .at(Utc.with_ymd_and_hms(2026, 3, 10, 3, 30, 0).unwrap());

        let outcome = score(&RiskConfig::default(), &at_3am, &clean_snapshot());
        assert_eq!(outcome.score, W_OFF_HOURS as u8);

        // 05:00 is outside the window (exclusive end)
        let at_5am = at_3am.clone().at(Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap());
        let outcome = score(&RiskConfig::default(), &at_5am, &clean_snapshot());
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn test_amount_tiers_do_not_stack() {
        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(12000)), &clean_snapshot());
        assert_eq!(outcome.score, W_MEDIUM_AMOUNT as u8);

        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(30000)), &clean_snapshot());
        assert_eq!(outcome.score, W_LARGE_AMOUNT as u8);
    }

    #[test]
    fn test_failed_auth_factor() {
        let mut snapshot = clean_snapshot();
        snapshot.failed_auth_recent = 3;
        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(100)), &snapshot);
        assert_eq!(outcome.score, 0); // exactly at threshold is fine

        snapshot.failed_auth_recent = 4;
        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(100)), &snapshot);
        assert_eq!(outcome.score, W_FAILED_AUTH as u8);
    }

    #[test]
    fn test_factors_are_additive() {
        let snapshot = InitiatorSnapshot {
            account_age_days: 1,
            verified: false,
            tx_count_last_hour: 8,
            completed_count: 10,
            avg_completed_amount: Some(dec!(1000)),
            ..Default::default()
        };

        // 3x average (25) + velocity (20) + new account (15) + unverified (10)
        // + large amount (15) = 85
        let outcome = score(&RiskConfig::default(), &proposed_at_noon(dec!(30000)), &snapshot);
        assert_eq!(outcome.score, 85);
        assert_eq!(outcome.reasons.len(), 5);
    }

    #[test]
    fn test_score_clamped_to_100() {
        let at_3am = ProposedTransfer::new(
            "user-1",
            dec!(30000),
            Currency::Usd,
            TransactionType::Transfer,
        )
        .at(Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap());

        let snapshot = InitiatorSnapshot {
            account_age_days: 0,
            verified: false,
            tx_count_last_hour: 20,
            completed_count: 10,
            avg_completed_amount: Some(dec!(100)),
            failed_auth_recent: 10,
            ..Default::default()
        };

        // All factors together would be 105; clamped.
        let outcome = score(&RiskConfig::default(), &at_3am, &snapshot);
        assert_eq!(outcome.score, 100);
    }
}
