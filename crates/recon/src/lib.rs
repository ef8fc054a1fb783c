//! Paycore Recon - balance/ledger drift detection
//!
//! Sweeps every ACTIVE wallet and recomputes its balance from ledger
//! entries. Detection only: the sweep mutates nothing, holds no locks,
//! and reads the pool directly, so it can run beside live traffic. Drift
//! is data in the report, never an error thrown at a caller.

use chrono::{DateTime, Utc};
use paycore_core::Currency;
use paycore_ledger::verify_wallet;
use paycore_store::{Store, WalletRepo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One wallet whose ledger does not reproduce its balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub wallet_id: String,
    pub owner_id: String,
    pub currency: Currency,
    /// Signed: recorded balance minus ledger-computed balance
    pub discrepancy: Decimal,
    pub recorded_balance: Decimal,
    pub computed_balance: Decimal,
}

/// Outcome of one full sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Wallets examined
    pub checked: usize,
    pub consistent_count: usize,
    pub mismatches: Vec<Mismatch>,
    /// Per-wallet verification failures; one failure never aborts the sweep
    pub errors: Vec<String>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && self.errors.is_empty()
    }
}

/// Full-sweep reconciliation over the active wallet set
pub struct ReconciliationService {
    store: Store,
}

impl ReconciliationService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Verify every ACTIVE wallet against its ledger
    pub async fn run_full(&self) -> Result<ReconciliationReport, sqlx::Error> {
        let started_at = Utc::now();

        // Ids only at this stage; each wallet row is decoded individually
        // below so one bad row cannot abort the sweep
        let wallet_ids = {
            let mut conn = self.store.pool().acquire().await?;
            WalletRepo::list_active_ids(&mut *conn)
                .await
                .map_err(store_to_sqlx)?
        };

        let mut consistent_count = 0;
        let mut mismatches = Vec::new();
        let mut errors = Vec::new();

        for wallet_id in &wallet_ids {
            let wallet = {
                let mut conn = self.store.pool().acquire().await?;
                match WalletRepo::get(&mut *conn, wallet_id).await {
                    Ok(wallet) => wallet,
                    Err(e) => {
                        errors.push(format!("wallet {}: {}", wallet_id, e));
                        continue;
                    }
                }
            };
            match verify_wallet(self.store.pool(), &wallet.id).await {
                Ok(verification) if verification.consistent => consistent_count += 1,
                Ok(verification) => {
                    tracing::warn!(
                        wallet = %wallet.id,
                        owner = %wallet.owner_id,
                        discrepancy = %verification.discrepancy,
                        "ledger drift detected"
                    );
                    mismatches.push(Mismatch {
                        wallet_id: wallet.id.clone(),
                        owner_id: wallet.owner_id.clone(),
                        currency: wallet.currency.clone(),
                        discrepancy: verification.discrepancy,
                        recorded_balance: verification.recorded_balance,
                        computed_balance: verification.computed_balance,
                    });
                }
                Err(e) => {
                    errors.push(format!("wallet {}: {}", wallet.id, e));
                }
            }
        }

        let report = ReconciliationReport {
            started_at,
            finished_at: Utc::now(),
            checked: wallet_ids.len(),
            consistent_count,
            mismatches,
            errors,
        };
        tracing::info!(
            checked = report.checked,
            mismatches = report.mismatches.len(),
            errors = report.errors.len(),
            "reconciliation sweep finished"
        );
        Ok(report)
    }
}

fn store_to_sqlx(e: paycore_store::StoreError) -> sqlx::Error {
    match e {
        paycore_store::StoreError::Database(inner) => inner,
        other => sqlx::Error::Protocol(other.to_string()),
    }
}
