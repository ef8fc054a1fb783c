//! Ledger entry type, append operation, and the entry-generation rule table

use chrono::{DateTime, Utc};
use paycore_core::TransactionType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::LedgerError;

/// One immutable ledger row: a single wallet's balance change caused by a
/// single transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic sequence assigned by the store; defines creation order
    pub seq: i64,
    /// Owning transaction
    pub transaction_id: String,
    /// Wallet touched by this entry
    pub wallet_id: String,
    /// Signed amount: negative = debit, positive = credit
    pub amount: Decimal,
    /// Wallet balance immediately after this entry, taken from the same
    /// unit of work that mutated the wallet (never a re-read)
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for appending one ledger row
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub transaction_id: String,
    pub wallet_id: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub description: Option<String>,
}

impl NewEntry {
    pub fn debit(
        transaction_id: impl Into<String>,
        wallet_id: impl Into<String>,
        amount: Decimal,
        balance_after: Decimal,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            wallet_id: wallet_id.into(),
            amount: -amount.abs(),
            balance_after,
            description: None,
        }
    }

    pub fn credit(
        transaction_id: impl Into<String>,
        wallet_id: impl Into<String>,
        amount: Decimal,
        balance_after: Decimal,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            wallet_id: wallet_id.into(),
            amount: amount.abs(),
            balance_after,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Append one immutable ledger row.
///
/// Must be called from within the same open unit of work that mutated the
/// wallet, with the `balance_after` value produced by that mutation. Entries
/// are never updated or deleted afterwards.
pub async fn record_entry(
    conn: &mut SqliteConnection,
    entry: NewEntry,
) -> Result<LedgerEntry, LedgerError> {
    if entry.amount.is_zero() {
        return Err(LedgerError::ZeroAmount);
    }
    if entry.transaction_id.trim().is_empty() {
        return Err(LedgerError::EmptyTransactionId);
    }

    let created_at = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO ledger_entries (transaction_id, wallet_id, amount, balance_after, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.transaction_id)
    .bind(&entry.wallet_id)
    .bind(entry.amount.to_string())
    .bind(entry.balance_after.to_string())
    .bind(&entry.description)
    .bind(created_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        transaction_id = %entry.transaction_id,
        wallet_id = %entry.wallet_id,
        amount = %entry.amount,
        "ledger entry recorded"
    );

    Ok(LedgerEntry {
        seq: result.last_insert_rowid(),
        transaction_id: entry.transaction_id,
        wallet_id: entry.wallet_id,
        amount: entry.amount,
        balance_after: entry.balance_after,
        description: entry.description,
        created_at,
    })
}

/// All entries for a wallet in creation order
pub async fn entries_for_wallet(
    conn: &mut SqliteConnection,
    wallet_id: &str,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    let rows = sqlx::query(
        "SELECT seq, transaction_id, wallet_id, amount, balance_after, description, created_at \
         FROM ledger_entries WHERE wallet_id = ? ORDER BY seq",
    )
    .bind(wallet_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

/// All entries written for a transaction, in creation order
pub async fn entries_for_transaction(
    conn: &mut SqliteConnection,
    transaction_id: &str,
) -> Result<Vec<LedgerEntry>, LedgerError> {
    let rows = sqlx::query(
        "SELECT seq, transaction_id, wallet_id, amount, balance_after, description, created_at \
         FROM ledger_entries WHERE transaction_id = ? ORDER BY seq",
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

pub(crate) fn entry_from_row(row: &SqliteRow) -> Result<LedgerEntry, LedgerError> {
    Ok(LedgerEntry {
        seq: row.get("seq"),
        transaction_id: row.get("transaction_id"),
        wallet_id: row.get("wallet_id"),
        amount: parse_decimal(row.get("amount"))?,
        balance_after: parse_decimal(row.get("balance_after"))?,
        description: row.get("description"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

pub(crate) fn parse_decimal(text: String) -> Result<Decimal, LedgerError> {
    text.parse().map_err(|_| LedgerError::Decode(text))
}

pub(crate) fn parse_timestamp(text: String) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| LedgerError::Decode(text))
}

/// The set of entries a transaction type must produce.
///
/// Flagged transfers withhold the credit side: funds leave the sender
/// immediately but the recipient is not credited until the flag is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryShape {
    /// One debit on the source wallet, one credit on the destination
    DebitAndCredit,
    /// Only the debit side (flagged transfer, withdrawal)
    DebitOnly,
    /// Only the credit side (deposit - external funding is not a wallet)
    CreditOnly,
    /// Exactly one entry, either direction (admin adjustment)
    Single,
}

impl EntryShape {
    /// The entry-generation rule table per transaction type.
    pub fn expected(tx_type: TransactionType, flagged: bool) -> Self {
        match tx_type {
            TransactionType::Deposit => EntryShape::CreditOnly,
            TransactionType::Withdrawal => EntryShape::DebitOnly,
            TransactionType::Adjustment => EntryShape::Single,
            two_sided => {
                if flagged && two_sided.supports_flag_hold() {
                    EntryShape::DebitOnly
                } else {
                    EntryShape::DebitAndCredit
                }
            }
        }
    }

    /// Check a transaction's written entries against this shape.
    ///
    /// Cross-currency pairs (conversions) are checked by direction only;
    /// their absolute amounts differ by the exchange rate, not 1:1.
    pub fn matches(&self, entries: &[LedgerEntry]) -> bool {
        let debits = entries.iter().filter(|e| e.amount < Decimal::ZERO).count();
        let credits = entries.iter().filter(|e| e.amount > Decimal::ZERO).count();

        match self {
            EntryShape::DebitAndCredit => debits == 1 && credits == 1,
            EntryShape::DebitOnly => debits == 1 && credits == 0,
            EntryShape::CreditOnly => debits == 0 && credits == 1,
            EntryShape::Single => entries.len() == 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(amount: Decimal) -> LedgerEntry {
        LedgerEntry {
            seq: 1,
            transaction_id: "tx".to_string(),
            wallet_id: "w".to_string(),
            amount,
            balance_after: dec!(0),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_debit_constructor_forces_negative() {
        let e = NewEntry::debit("tx-1", "w-1", dec!(200), dec!(800));
        assert_eq!(e.amount, dec!(-200));
    }

    #[test]
    fn test_credit_constructor_forces_positive() {
        let e = NewEntry::credit("tx-1", "w-1", dec!(-200), dec!(250));
        assert_eq!(e.amount, dec!(200));
    }

    #[test]
    fn test_shape_rule_table() {
        assert_eq!(
            EntryShape::expected(TransactionType::Transfer, false),
            EntryShape::DebitAndCredit
        );
        assert_eq!(
            EntryShape::expected(TransactionType::Transfer, true),
            EntryShape::DebitOnly
        );
        assert_eq!(
            EntryShape::expected(TransactionType::PosPayment, true),
            EntryShape::DebitOnly
        );
        assert_eq!(
            EntryShape::expected(TransactionType::Deposit, false),
            EntryShape::CreditOnly
        );
        assert_eq!(
            EntryShape::expected(TransactionType::Withdrawal, false),
            EntryShape::DebitOnly
        );
        assert_eq!(
            EntryShape::expected(TransactionType::Adjustment, false),
            EntryShape::Single
        );
    }

    #[test]
    fn test_shape_matches_transfer_pair() {
        let entries = vec![entry(dec!(-200)), entry(dec!(200))];
        assert!(EntryShape::DebitAndCredit.matches(&entries));
        assert!(!EntryShape::DebitOnly.matches(&entries));
    }

    #[test]
    fn test_shape_matches_flagged_transfer() {
        let entries = vec![entry(dec!(-200))];
        assert!(EntryShape::DebitOnly.matches(&entries));
        assert!(EntryShape::Single.matches(&entries));
        assert!(!EntryShape::DebitAndCredit.matches(&entries));
    }

    #[test]
    fn test_shape_conversion_asymmetric_amounts() {
        // 100 USD debited, 92 EUR credited - direction is what matters
        let entries = vec![entry(dec!(-100)), entry(dec!(92))];
        assert!(EntryShape::DebitAndCredit.matches(&entries));
    }
}
