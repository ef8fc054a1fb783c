//! Paycore Ledger - Append-only entry history per wallet
//!
//! This is the source of truth for every balance change. One row is
//! appended per wallet touched by a transaction, carrying a signed amount
//! (negative = debit, positive = credit) and the wallet balance snapshot
//! produced by the same unit of work.
//!
//! # Key operations
//! - [`record_entry`] - append one immutable row inside an open unit of work
//! - [`verify_wallet`] - recompute a wallet's balance from its entry history
//! - [`EntryShape`] - the entry-generation rule table per transaction type

pub mod entry;
pub mod error;
pub mod verify;

pub use entry::{record_entry, entries_for_transaction, entries_for_wallet, EntryShape, LedgerEntry, NewEntry};
pub use error::LedgerError;
pub use verify::{verify_wallet, WalletVerification};
