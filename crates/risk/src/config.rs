//! Risk configuration with configurable thresholds
//!
//! All thresholds can be overridden via config file; defaults are the
//! production values. The AML velocity threshold (10/hour) and the fraud
//! velocity threshold (5/hour) intentionally diverge and stay independently
//! configurable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for AML rules and the fraud engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    // === AML rule thresholds ===
    /// Amount at or above which the high-value AML flag fires
    #[serde(default = "default_aml_high_value_threshold")]
    pub aml_high_value_threshold: Decimal,

    /// Transactions per trailing hour above which the AML velocity flag fires
    #[serde(default = "default_aml_velocity_per_hour")]
    pub aml_velocity_per_hour: u32,

    /// Cumulative same-day volume cap (existing volume + this amount)
    #[serde(default = "default_aml_daily_volume_cap")]
    pub aml_daily_volume_cap: Decimal,

    /// Account age (days) below which the new-account rule applies
    #[serde(default = "default_aml_new_account_days")]
    pub aml_new_account_days: i64,

    /// Amount threshold paired with the new-account rule
    #[serde(default = "default_aml_new_account_amount")]
    pub aml_new_account_amount: Decimal,

    /// Amount above which unverified identities are flagged
    #[serde(default = "default_aml_unverified_amount")]
    pub aml_unverified_amount: Decimal,

    // === Fraud engine thresholds ===
    /// Transactions per trailing hour above which the fraud velocity factor fires
    #[serde(default = "default_fraud_velocity_per_hour")]
    pub fraud_velocity_per_hour: u32,

    /// Multiplier over the historical average amount
    #[serde(default = "default_fraud_avg_multiplier")]
    pub fraud_avg_multiplier: Decimal,

    /// Minimum prior completed transactions before the average factor applies
    #[serde(default = "default_fraud_min_history")]
    pub fraud_min_history: u64,

    /// Account age (days) below which the fraud new-account factor fires
    #[serde(default = "default_fraud_new_account_days")]
    pub fraud_new_account_days: i64,

    /// Failed authentication attempts above which the auth factor fires
    #[serde(default = "default_fraud_failed_auth_threshold")]
    pub fraud_failed_auth_threshold: u32,

    /// Large absolute amount factor threshold
    #[serde(default = "default_fraud_large_amount")]
    pub fraud_large_amount: Decimal,

    /// Medium absolute amount factor threshold
    #[serde(default = "default_fraud_medium_amount")]
    pub fraud_medium_amount: Decimal,

    /// Off-hours window start hour (UTC, inclusive)
    #[serde(default = "default_off_hours_start")]
    pub off_hours_start: u32,

    /// Off-hours window end hour (UTC, exclusive)
    #[serde(default = "default_off_hours_end")]
    pub off_hours_end: u32,
}

// Default value functions for serde

fn default_aml_high_value_threshold() -> Decimal {
    Decimal::new(10_000, 0)
}

fn default_aml_velocity_per_hour() -> u32 {
    10
}

fn default_aml_daily_volume_cap() -> Decimal {
    Decimal::new(50_000, 0)
}

fn default_aml_new_account_days() -> i64 {
    7
}

fn default_aml_new_account_amount() -> Decimal {
    Decimal::new(5_000, 0)
}

fn default_aml_unverified_amount() -> Decimal {
    Decimal::new(1_000, 0)
}

fn default_fraud_velocity_per_hour() -> u32 {
    5
}

fn default_fraud_avg_multiplier() -> Decimal {
    Decimal::new(3, 0)
}

fn default_fraud_min_history() -> u64 {
    6
}

fn default_fraud_new_account_days() -> i64 {
    3
}

fn default_fraud_failed_auth_threshold() -> u32 {
    3
}

fn default_fraud_large_amount() -> Decimal {
    Decimal::new(25_000, 0)
}

fn default_fraud_medium_amount() -> Decimal {
    Decimal::new(10_000, 0)
}

fn default_off_hours_start() -> u32 {
    1
}

fn default_off_hours_end() -> u32 {
    5
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            aml_high_value_threshold: default_aml_high_value_threshold(),
            aml_velocity_per_hour: default_aml_velocity_per_hour(),
            aml_daily_volume_cap: default_aml_daily_volume_cap(),
            aml_new_account_days: default_aml_new_account_days(),
            aml_new_account_amount: default_aml_new_account_amount(),
            aml_unverified_amount: default_aml_unverified_amount(),
            fraud_velocity_per_hour: default_fraud_velocity_per_hour(),
            fraud_avg_multiplier: default_fraud_avg_multiplier(),
            fraud_min_history: default_fraud_min_history(),
            fraud_new_account_days: default_fraud_new_account_days(),
            fraud_failed_auth_threshold: default_fraud_failed_auth_threshold(),
            fraud_large_amount: default_fraud_large_amount(),
            fraud_medium_amount: default_fraud_medium_amount(),
            off_hours_start: default_off_hours_start(),
            off_hours_end: default_off_hours_end(),
        }
    }
}

impl RiskConfig {
    /// Load configuration from a JSON file; missing fields use defaults
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
