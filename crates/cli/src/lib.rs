//! Paycore CLI - command orchestration
//!
//! Wires the store, risk scorer, audit trail and transaction service
//! into an application context the binary drives.

pub mod commands;
pub mod context;

pub use context::AppContext;
