//! Currency - Type-safe currency codes
//!
//! Common currencies are pre-defined; anything else falls back to the
//! `Other` variant so onboarding a new currency never requires a release.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing currencies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Empty currency code")]
    EmptyCode,

    #[error("Currency code too long (max 10 chars): {0}")]
    TooLong(String),

    #[error("Invalid currency code format: {0}")]
    InvalidFormat(String),
}

/// Currency codes
///
/// # Examples
/// ```
/// use paycore_core::Currency;
///
/// let usd: Currency = "USD".parse().unwrap();
/// assert_eq!(usd, Currency::Usd);
/// assert_eq!(usd.to_string(), "USD");
///
/// // Custom code
/// let custom: Currency = "MYTOKEN".parse().unwrap();
/// assert!(matches!(custom, Currency::Other(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Currency {
    // === Fiat ===
    /// US Dollar
    Usd,
    /// Euro
    Eur,
    /// British Pound
    Gbp,
    /// Japanese Yen
    Jpy,

    // === Crypto ===
    /// Bitcoin
    Btc,
    /// Ethereum
    Eth,
    /// Tether USD
    Usdt,
    /// USD Coin
    Usdc,

    /// Any other currency code (uppercase, alphanumeric)
    Other(String),
}

impl Currency {
    /// The canonical uppercase code
    pub fn code(&self) -> &str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Usdt => "USDT",
            Currency::Usdc => "USDC",
            Currency::Other(code) => code,
        }
    }

    /// Whether this is one of the known crypto assets
    pub fn is_crypto(&self) -> bool {
        matches!(
            self,
            Currency::Btc | Currency::Eth | Currency::Usdt | Currency::Usdc
        )
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();

        if code.is_empty() {
            return Err(CurrencyError::EmptyCode);
        }
        if code.len() > 10 {
            return Err(CurrencyError::TooLong(code));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CurrencyError::InvalidFormat(code));
        }

        Ok(match code.as_str() {
            "USD" => Currency::Usd,
            "EUR" => Currency::Eur,
            "GBP" => Currency::Gbp,
            "JPY" => Currency::Jpy,
            "BTC" => Currency::Btc,
            "ETH" => Currency::Eth,
            "USDT" => Currency::Usdt,
            "USDC" => Currency::Usdc,
            _ => Currency::Other(code),
        })
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_currency() {
        let usd: Currency = "usd".parse().unwrap();
        assert_eq!(usd, Currency::Usd);
    }

    #[test]
    fn test_parse_custom_currency() {
        let custom: Currency = "ABCDE".parse().unwrap();
        assert_eq!(custom, Currency::Other("ABCDE".to_string()));
        assert_eq!(custom.code(), "ABCDE");
    }

    #[test]
    fn test_parse_empty_rejected() {
        let result: Result<Currency, _> = "".parse();
        assert_eq!(result, Err(CurrencyError::EmptyCode));
    }

    #[test]
    fn test_parse_invalid_chars_rejected() {
        let result: Result<Currency, _> = "US-D".parse();
        assert!(matches!(result, Err(CurrencyError::InvalidFormat(_))));
    }

    #[test]
    fn test_code_roundtrip() {
        for code in ["USD", "EUR", "BTC", "ETH", "USDT"] {
            let currency: Currency = code.parse().unwrap();
            assert_eq!(currency.to_string(), code);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Currency::Btc).unwrap();
        assert_eq!(json, "\"BTC\"");

        let parsed: Currency = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(parsed, Currency::Eur);
    }
}
