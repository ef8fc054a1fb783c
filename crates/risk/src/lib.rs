//! Paycore Risk Scoring
//!
//! Real-time risk evaluation for every proposed money movement, composed of
//! two independently testable pure functions and one aggregator:
//!
//! - [`aml::check`] - boolean threshold/velocity/compliance rules, each true
//!   rule contributing one named flag
//! - [`fraud::score`] - additive 0-100 statistical anomaly score
//! - [`RiskScorer`] - fetches the initiator snapshot, runs both checks
//!   concurrently, and combines them into one recommendation
//!
//! The combined score, not either sub-score alone, is what the Transaction
//! Service acts on.

pub mod aml;
pub mod config;
pub mod error;
pub mod fraud;
pub mod scorer;
pub mod types;

pub use config::RiskConfig;
pub use error::RiskError;
pub use scorer::{combine, RiskScorer};
pub use types::{
    AmlOutcome, FraudOutcome, InitiatorHistory, InitiatorSnapshot, ProposedTransfer,
    RiskAssessment, RiskFlag,
};
