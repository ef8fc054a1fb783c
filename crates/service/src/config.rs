//! Service configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What happens to the withheld debit of a held transfer.
///
/// Resolution itself is an out-of-band compliance action; this policy only
/// states the default disposition operators work against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeldFundsPolicy {
    /// Funds stay debited until a reviewer releases or reverses them
    #[default]
    ManualRelease,
    /// Funds are reversed automatically when the report is dismissed
    AutoReverseOnDismiss,
}

/// Tuning knobs for the transaction service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Deadline for one risk assessment call, in milliseconds.
    /// Exceeding it yields the fail-safe HOLD assessment.
    #[serde(default = "default_risk_timeout_ms")]
    pub risk_timeout_ms: u64,

    /// Fee applied to transfers when the request does not set one
    #[serde(default = "default_fee")]
    pub default_fee: Decimal,

    #[serde(default)]
    pub held_funds_policy: HeldFundsPolicy,
}

fn default_risk_timeout_ms() -> u64 {
    2_000
}

fn default_fee() -> Decimal {
    Decimal::ZERO
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            risk_timeout_ms: default_risk_timeout_ms(),
            default_fee: default_fee(),
            held_funds_policy: HeldFundsPolicy::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(std::io::Error::other)
    }

    pub fn risk_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.risk_timeout_ms)
    }
}
