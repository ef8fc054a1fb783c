//! Balance verification - recompute a wallet's balance from entry history

use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};

use crate::entry::{entry_from_row, parse_decimal};
use crate::error::LedgerError;

/// Result of verifying one wallet against its ledger history
#[derive(Debug, Clone, PartialEq)]
pub struct WalletVerification {
    pub wallet_id: String,
    /// True when the entry sum and the latest snapshot both match the
    /// wallet's recorded balance
    pub consistent: bool,
    /// Balance currently recorded on the wallet row
    pub recorded_balance: Decimal,
    /// Chronological sum of all entry amounts
    pub computed_balance: Decimal,
    /// `recorded - computed`; zero when consistent
    pub discrepancy: Decimal,
    pub entry_count: usize,
}

/// Recompute the running sum of a wallet's entries in creation order and
/// compare it with the wallet's current balance.
///
/// For a wallet with zero entries, consistency requires balance == 0.
/// This is a read-only detection path: it takes plain pool reads and holds
/// no locks, so it can run concurrently with live traffic.
pub async fn verify_wallet(
    pool: &SqlitePool,
    wallet_id: &str,
) -> Result<WalletVerification, LedgerError> {
    let wallet_row = sqlx::query("SELECT balance FROM wallets WHERE id = ?")
        .bind(wallet_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;

    let recorded_balance = parse_decimal(wallet_row.get("balance"))?;

    let rows = sqlx::query(
        "SELECT seq, transaction_id, wallet_id, amount, balance_after, description, created_at \
         FROM ledger_entries WHERE wallet_id = ? ORDER BY seq",
    )
    .bind(wallet_id)
    .fetch_all(pool)
    .await?;

    let mut computed_balance = Decimal::ZERO;
    let mut latest_snapshot = None;
    for row in &rows {
        let entry = entry_from_row(row)?;
        computed_balance += entry.amount;
        latest_snapshot = Some(entry.balance_after);
    }

    let sum_matches = computed_balance == recorded_balance;
    let snapshot_matches = match latest_snapshot {
        Some(balance_after) => balance_after == recorded_balance,
        None => recorded_balance.is_zero(),
    };
    let consistent = sum_matches && snapshot_matches;

    if !consistent {
        tracing::warn!(
            wallet_id,
            %recorded_balance,
            %computed_balance,
            "wallet balance does not match ledger history"
        );
    }

    Ok(WalletVerification {
        wallet_id: wallet_id.to_string(),
        consistent,
        recorded_balance,
        computed_balance,
        discrepancy: recorded_balance - computed_balance,
        entry_count: rows.len(),
    })
}
