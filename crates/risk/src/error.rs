//! Risk scoring errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Unknown initiator: {0}")]
    UnknownInitiator(String),

    #[error("History lookup failed: {0}")]
    History(String),
}
