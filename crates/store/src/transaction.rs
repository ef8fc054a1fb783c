//! Transaction store accessor
//!
//! One row per money movement. The `reference` column is UNIQUE and backs
//! idempotency: retrying a request with the same reference hits the
//! constraint instead of moving money twice.

use chrono::{DateTime, Utc};
use paycore_core::{Currency, TransactionStatus, TransactionType, TxMetadata};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::wallet::{parse_decimal, parse_timestamp};

/// A persisted money movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    /// Caller-supplied idempotency key
    pub reference: String,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub from_wallet_id: Option<String>,
    pub to_wallet_id: Option<String>,
    pub initiator_id: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub currency: Currency,
    pub target_currency: Option<Currency>,
    pub exchange_rate: Option<Decimal>,
    pub converted_amount: Option<Decimal>,
    pub risk_score: i64,
    pub description: Option<String>,
    pub metadata: TxMetadata,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a transaction row
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub reference: String,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub from_wallet_id: Option<String>,
    pub to_wallet_id: Option<String>,
    pub initiator_id: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub currency: Currency,
    pub target_currency: Option<Currency>,
    pub exchange_rate: Option<Decimal>,
    pub converted_amount: Option<Decimal>,
    pub risk_score: i64,
    pub description: Option<String>,
    pub metadata: TxMetadata,
}

impl NewTransaction {
    /// A same-currency movement with no conversion fields
    pub fn simple(
        reference: impl Into<String>,
        tx_type: TransactionType,
        status: TransactionStatus,
        initiator_id: impl Into<String>,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            reference: reference.into(),
            tx_type,
            status,
            from_wallet_id: None,
            to_wallet_id: None,
            initiator_id: initiator_id.into(),
            amount,
            fee: Decimal::ZERO,
            currency,
            target_currency: None,
            exchange_rate: None,
            converted_amount: None,
            risk_score: 0,
            description: None,
            metadata: TxMetadata::default(),
        }
    }
}

/// Repository for the transactions table
pub struct TransactionRepo;

impl TransactionRepo {
    /// Insert a transaction row.
    ///
    /// A UNIQUE violation on `reference` maps to `DuplicateReference` so
    /// the service layer can surface the prior transaction instead.
    pub async fn insert(
        conn: &mut SqliteConnection,
        new: NewTransaction,
    ) -> StoreResult<TransactionRecord> {
        let record = TransactionRecord {
            id: Uuid::new_v4().to_string(),
            reference: new.reference,
            tx_type: new.tx_type,
            status: new.status,
            from_wallet_id: new.from_wallet_id,
            to_wallet_id: new.to_wallet_id,
            initiator_id: new.initiator_id,
            amount: new.amount,
            fee: new.fee,
            currency: new.currency,
            target_currency: new.target_currency,
            exchange_rate: new.exchange_rate,
            converted_amount: new.converted_amount,
            risk_score: new.risk_score,
            description: new.description,
            metadata: new.metadata,
            created_at: Utc::now(),
        };

        let metadata_json =
            serde_json::to_string(&record.metadata).map_err(|e| StoreError::Decode(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO transactions
                (id, reference, tx_type, status, from_wallet_id, to_wallet_id, initiator_id,
                 amount, fee, currency, target_currency, exchange_rate, converted_amount,
                 risk_score, description, metadata, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.reference)
        .bind(record.tx_type.to_string())
        .bind(record.status.to_string())
        .bind(&record.from_wallet_id)
        .bind(&record.to_wallet_id)
        .bind(&record.initiator_id)
        .bind(record.amount.to_string())
        .bind(record.fee.to_string())
        .bind(record.currency.code())
        .bind(record.target_currency.as_ref().map(|c| c.code().to_string()))
        .bind(record.exchange_rate.map(|d| d.to_string()))
        .bind(record.converted_amount.map(|d| d.to_string()))
        .bind(record.risk_score)
        .bind(&record.description)
        .bind(&metadata_json)
        .bind(record.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await;

        match result {
            Ok(_) => Ok(record),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::DuplicateReference(record.reference))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a transaction by id
    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<TransactionRecord> {
        sqlx::query("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(|row| record_from_row(&row))
            .transpose()?
            .ok_or_else(|| StoreError::not_found("Transaction", id))
    }

    /// Look up a prior transaction by its idempotency reference
    pub async fn find_by_reference(
        conn: &mut SqliteConnection,
        reference: &str,
    ) -> StoreResult<Option<TransactionRecord>> {
        sqlx::query("SELECT * FROM transactions WHERE reference = ?")
            .bind(reference)
            .fetch_optional(&mut *conn)
            .await?
            .map(|row| record_from_row(&row))
            .transpose()
    }

    /// Update the lifecycle status of a transaction.
    ///
    /// Rows that already reached a terminal status are immutable.
    pub async fn set_status(
        conn: &mut SqliteConnection,
        id: &str,
        status: TransactionStatus,
    ) -> StoreResult<()> {
        let current = Self::get(&mut *conn, id).await?;
        if current.status.is_terminal() {
            return Err(StoreError::TerminalStatus {
                id: id.to_string(),
                status: current.status.to_string(),
            });
        }

        sqlx::query("UPDATE transactions SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Transactions started by an initiator at or after a point in time.
    ///
    /// Sums over these are computed by the caller in `Decimal`; SQLite
    /// would sum TEXT columns as floats.
    pub async fn list_for_initiator_since(
        conn: &mut SqliteConnection,
        initiator_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<TransactionRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE initiator_id = ? AND created_at >= ? ORDER BY created_at",
        )
        .bind(initiator_id)
        .bind(since.to_rfc3339())
        .fetch_all(&mut *conn)
        .await?;
        rows.iter().map(record_from_row).collect()
    }

    /// Count of completed transactions for an initiator, computed in SQL
    pub async fn count_completed(
        conn: &mut SqliteConnection,
        initiator_id: &str,
    ) -> StoreResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM transactions WHERE initiator_id = ? AND status = 'COMPLETED'",
        )
        .bind(initiator_id)
        .fetch_one(&mut *conn)
        .await?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }

    /// Amounts of the most recent completed transactions, newest first.
    ///
    /// Returned as `Decimal` for summing in Rust; the window bound keeps
    /// long histories out of memory.
    pub async fn recent_completed_amounts(
        conn: &mut SqliteConnection,
        initiator_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<Decimal>> {
        let rows = sqlx::query(
            r#"
            SELECT amount FROM transactions
            WHERE initiator_id = ? AND status = 'COMPLETED'
            ORDER BY created_at DESC LIMIT ?
            "#,
        )
        .bind(initiator_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
        rows.iter()
            .map(|row| parse_decimal(row.get("amount")))
            .collect()
    }

    /// All transactions touching a wallet on either side, newest first
    pub async fn list_for_wallet(
        conn: &mut SqliteConnection,
        wallet_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<TransactionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE from_wallet_id = ? OR to_wallet_id = ?
            ORDER BY created_at DESC LIMIT ?
            "#,
        )
        .bind(wallet_id)
        .bind(wallet_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;
        rows.iter().map(record_from_row).collect()
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn record_from_row(row: &SqliteRow) -> StoreResult<TransactionRecord> {
    let tx_type: String = row.get("tx_type");
    let status: String = row.get("status");
    let currency: String = row.get("currency");
    let target_currency: Option<String> = row.get("target_currency");
    let exchange_rate: Option<String> = row.get("exchange_rate");
    let converted_amount: Option<String> = row.get("converted_amount");
    let metadata: String = row.get("metadata");

    Ok(TransactionRecord {
        id: row.get("id"),
        reference: row.get("reference"),
        tx_type: TransactionType::from_str(&tx_type).map_err(|_| StoreError::Decode(tx_type))?,
        status: TransactionStatus::from_str(&status).map_err(|_| StoreError::Decode(status))?,
        from_wallet_id: row.get("from_wallet_id"),
        to_wallet_id: row.get("to_wallet_id"),
        initiator_id: row.get("initiator_id"),
        amount: parse_decimal(row.get("amount"))?,
        fee: parse_decimal(row.get("fee"))?,
        currency: Currency::from_str(&currency).map_err(|_| StoreError::Decode(currency))?,
        target_currency: target_currency
            .map(|c| Currency::from_str(&c).map_err(|_| StoreError::Decode(c)))
            .transpose()?,
        exchange_rate: exchange_rate.map(parse_decimal).transpose()?,
        converted_amount: converted_amount.map(parse_decimal).transpose()?,
        risk_score: row.get("risk_score"),
        description: row.get("description"),
        metadata: serde_json::from_str(&metadata).map_err(|_| StoreError::Decode(metadata))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;
    use rust_decimal_macros::dec;

    async fn test_store() -> Store {
        let store = Store::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    fn transfer(reference: &str, amount: Decimal) -> NewTransaction {
        NewTransaction::simple(
            reference,
            TransactionType::Transfer,
            TransactionStatus::Completed,
            "alice",
            amount,
            Currency::Usd,
        )
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trips() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();

        let mut new = transfer("ref-1", dec!(250.50));
        new.from_wallet_id = Some("w-from".to_string());
        new.to_wallet_id = Some("w-to".to_string());
        new.risk_score = 35;

        let inserted = TransactionRepo::insert(&mut tx, new).await.unwrap();
        let fetched = TransactionRepo::get(&mut tx, &inserted.id).await.unwrap();

        assert_eq!(fetched, inserted);
        assert_eq!(fetched.amount, dec!(250.50));
        assert_eq!(fetched.risk_score, 35);
    }

    #[tokio::test]
    async fn test_duplicate_reference_is_rejected() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();

        TransactionRepo::insert(&mut tx, transfer("ref-1", dec!(100))).await.unwrap();
        let result = TransactionRepo::insert(&mut tx, transfer("ref-1", dec!(200))).await;

        assert!(matches!(result, Err(StoreError::DuplicateReference(r)) if r == "ref-1"));
    }

    #[tokio::test]
    async fn test_find_by_reference() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();

        let inserted = TransactionRepo::insert(&mut tx, transfer("ref-1", dec!(100))).await.unwrap();

        let found = TransactionRepo::find_by_reference(&mut tx, "ref-1").await.unwrap();
        assert_eq!(found, Some(inserted));

        let missing = TransactionRepo::find_by_reference(&mut tx, "ref-2").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_set_status() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();

        let mut new = transfer("ref-1", dec!(100));
        new.status = TransactionStatus::Flagged;
        let inserted = TransactionRepo::insert(&mut tx, new).await.unwrap();

        TransactionRepo::set_status(&mut tx, &inserted.id, TransactionStatus::Completed)
            .await
            .unwrap();

        let fetched = TransactionRepo::get(&mut tx, &inserted.id).await.unwrap();
        assert_eq!(fetched.status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn test_completed_rows_are_immutable() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();

        let inserted = TransactionRepo::insert(&mut tx, transfer("ref-1", dec!(100))).await.unwrap();

        let result = TransactionRepo::set_status(&mut tx, &inserted.id, TransactionStatus::Failed).await;
        assert!(matches!(result, Err(StoreError::TerminalStatus { .. })));
    }

    #[tokio::test]
    async fn test_list_for_wallet_matches_either_side() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();

        let mut outgoing = transfer("ref-1", dec!(10));
        outgoing.from_wallet_id = Some("w-1".to_string());
        outgoing.to_wallet_id = Some("w-2".to_string());
        TransactionRepo::insert(&mut tx, outgoing).await.unwrap();

        let mut incoming = transfer("ref-2", dec!(20));
        incoming.from_wallet_id = Some("w-3".to_string());
        incoming.to_wallet_id = Some("w-1".to_string());
        TransactionRepo::insert(&mut tx, incoming).await.unwrap();

        let mut unrelated = transfer("ref-3", dec!(30));
        unrelated.from_wallet_id = Some("w-3".to_string());
        unrelated.to_wallet_id = Some("w-2".to_string());
        TransactionRepo::insert(&mut tx, unrelated).await.unwrap();

        let listed = TransactionRepo::list_for_wallet(&mut tx, "w-1", 10).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_list_for_initiator_since_filters_by_time() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();

        TransactionRepo::insert(&mut tx, transfer("ref-1", dec!(10))).await.unwrap();

        let future = Utc::now() + chrono::Duration::hours(1);
        let none = TransactionRepo::list_for_initiator_since(&mut tx, "alice", future)
            .await
            .unwrap();
        assert!(none.is_empty());

        let past = Utc::now() - chrono::Duration::hours(1);
        let all = TransactionRepo::list_for_initiator_since(&mut tx, "alice", past)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_completed_aggregates_skip_failed_and_honor_window() {
        let store = test_store().await;
        let mut tx = store.begin().await.unwrap();

        TransactionRepo::insert(&mut tx, transfer("ref-1", dec!(100))).await.unwrap();
        TransactionRepo::insert(&mut tx, transfer("ref-2", dec!(300))).await.unwrap();
        let mut failed = transfer("ref-3", dec!(9999));
        failed.status = TransactionStatus::Failed;
        TransactionRepo::insert(&mut tx, failed).await.unwrap();

        let count = TransactionRepo::count_completed(&mut tx, "alice").await.unwrap();
        assert_eq!(count, 2);

        let amounts = TransactionRepo::recent_completed_amounts(&mut tx, "alice", 10)
            .await
            .unwrap();
        assert_eq!(amounts.len(), 2);
        let total: Decimal = amounts.iter().copied().sum();
        assert_eq!(total, dec!(400));

        let bounded = TransactionRepo::recent_completed_amounts(&mut tx, "alice", 1)
            .await
            .unwrap();
        assert_eq!(bounded.len(), 1);
    }
}
