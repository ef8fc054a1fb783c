//! AML rule checker
//!
//! Evaluates independent boolean rules against one proposed transaction.
//! Each true rule contributes one named flag; the risk level is a step
//! function of the flag count.

use paycore_core::RiskLevel;

use crate::config::RiskConfig;
use crate::types::{AmlOutcome, InitiatorSnapshot, ProposedTransfer, RiskFlag};

/// Evaluate all AML rules against one proposed transaction.
///
/// Pure function: all historical inputs come through the snapshot.
pub fn check(
    config: &RiskConfig,
    proposed: &ProposedTransfer,
    snapshot: &InitiatorSnapshot,
) -> AmlOutcome {
    let mut flags = Vec::new();

    // High-value threshold
    if proposed.amount >= config.aml_high_value_threshold {
        flags.push(RiskFlag::HighValueAmount);
    }

    // Trailing-hour velocity
    if snapshot.tx_count_last_hour > config.aml_velocity_per_hour {
        flags.push(RiskFlag::HighVelocity);
    }

    // Cumulative same-day volume including this amount
    if snapshot.volume_today + proposed.amount > config.aml_daily_volume_cap {
        flags.push(RiskFlag::DailyCapExceeded);
    }

    // Young account moving a non-trivial amount
    if snapshot.account_age_days < config.aml_new_account_days
        && proposed.amount > config.aml_new_account_amount
    {
        flags.push(RiskFlag::NewAccountHighAmount);
    }

    // Unverified identity moving anything meaningful
    if !snapshot.verified && proposed.amount > config.aml_unverified_amount {
        flags.push(RiskFlag::UnverifiedIdentity);
    }

    let level = level_for_flag_count(flags.len());

    AmlOutcome { flags, level }
}

/// Step function: 0 flags LOW, 1 MEDIUM, 2 HIGH, 3+ CRITICAL
fn level_for_flag_count(count: usize) -> RiskLevel {
    match count {
        0 => RiskLevel::Low,
        1 => RiskLevel::Medium,
        2 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}
