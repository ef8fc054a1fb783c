//! Exchange rate seam
//!
//! Conversion paths consume a rate at transaction time; sourcing and
//! caching rates is outside this core. The lookup is injected so tests
//! can pin deterministic rates.

use async_trait::async_trait;
use paycore_core::Currency;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Currency-pair to rate lookup
#[async_trait]
pub trait RateLookup: Send + Sync {
    /// The multiplier taking one unit of `from` into `to`, if known
    async fn rate(&self, from: &Currency, to: &Currency) -> Option<Decimal>;
}

/// Static rate table
#[derive(Default)]
pub struct FixedRateLookup {
    rates: HashMap<(Currency, Currency), Decimal>,
}

impl FixedRateLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a pair in both directions
    pub fn with_rate(mut self, from: Currency, to: Currency, rate: Decimal) -> Self {
        if !rate.is_zero() {
            self.rates.insert((to.clone(), from.clone()), Decimal::ONE / rate);
        }
        self.rates.insert((from, to), rate);
        self
    }
}

#[async_trait]
impl RateLookup for FixedRateLookup {
    async fn rate(&self, from: &Currency, to: &Currency) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        self.rates.get(&(from.clone(), to.clone())).copied()
    }
}
