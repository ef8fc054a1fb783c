//! Typed transaction metadata
//!
//! Metadata on transactions is a key-value map with a closed set of
//! recognized keys rather than an untyped blob, so invariant-checking code
//! can stay exhaustive over what a transaction may carry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// The closed set of recognized metadata keys
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetadataKey {
    /// Exchange rate applied on a conversion-type transaction
    ExchangeRate,
    /// Credited amount after conversion
    ConvertedAmount,
    /// Mandatory operator reason on an adjustment
    AdjustmentReason,
    /// Acting administrator on an adjustment
    AdminId,
    /// Client IP captured for audit purposes
    ClientIp,
    /// Originating channel (api, pos, admin)
    Channel,
    /// Free-text note
    Note,
}

/// Typed metadata map carried on a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxMetadata(BTreeMap<MetadataKey, Value>);

impl TxMetadata {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning self for chaining
    pub fn with(mut self, key: MetadataKey, value: impl Into<Value>) -> Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn insert(&mut self, key: MetadataKey, value: impl Into<Value>) {
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: MetadataKey) -> Option<&Value> {
        self.0.get(&key)
    }

    /// Get a value as &str if it is a JSON string
    pub fn get_str(&self, key: MetadataKey) -> Option<&str> {
        self.0.get(&key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
