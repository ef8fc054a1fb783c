//! Paycore Store - Transactional persistence adapter
//!
//! All balance mutations go through a single unit of work
//! (`sqlx::Transaction`): wallet mutation, transaction row, and ledger
//! entries commit or roll back together. Reads for balance checks happen
//! through the same open transaction, never against a row another unit of
//! work is mid-mutating.
//!
//! Decimals are stored as TEXT and parsed back; SQLite has no
//! decimal-precision numeric type and REAL would introduce float rounding
//! into money fields.

pub mod error;
pub mod fraud;
pub mod history;
pub mod initiator;
pub mod schema;
pub mod transaction;
pub mod wallet;

pub use error::StoreError;
pub use fraud::{FraudReport, FraudReportRepo, NewFraudReport};
pub use history::StoreHistory;
pub use initiator::{Initiator, InitiatorRepo};
pub use transaction::{NewTransaction, TransactionRecord, TransactionRepo};
pub use wallet::{NewWallet, Wallet, WalletRepo};

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Handle to the backing database
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect to a SQLite database file, creating it if needed
    pub async fn connect(path: &std::path::Path) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&url).await?;
        Ok(Self { pool })
    }

    /// In-memory database for tests.
    ///
    /// Capped at one connection: each SQLite in-memory connection is its
    /// own database, so a larger pool would scatter tables across them.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Create all tables and indexes
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        schema::init(&self.pool).await
    }

    /// Begin a unit of work.
    ///
    /// Every money movement runs inside exactly one of these; dropping it
    /// without commit rolls everything back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin().await?)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
