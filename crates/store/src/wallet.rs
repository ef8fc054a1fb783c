//! Wallet store accessor
//!
//! Owns the per-wallet mutation discipline: `debit` and `credit` execute
//! against an open unit of work and update `balance` and
//! `available_balance` in lockstep. Holds (which would touch only the
//! available side) are not part of this core.

use chrono::{DateTime, Utc};
use paycore_core::{Currency, WalletStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// One wallet per (owner, currency)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub owner_id: String,
    pub currency: Currency,
    /// Total balance
    pub balance: Decimal,
    /// Spendable balance; <= balance whenever holds exist
    pub available_balance: Decimal,
    pub status: WalletStatus,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }
}

/// Input for creating a wallet
#[derive(Debug, Clone)]
pub struct NewWallet {
    pub owner_id: String,
    pub currency: Currency,
    pub is_default: bool,
}

/// Repository for the wallets table
pub struct WalletRepo;

impl WalletRepo {
    /// Create a wallet with zero balance
    pub async fn create(conn: &mut SqliteConnection, new: NewWallet) -> StoreResult<Wallet> {
        let now = Utc::now();
        let wallet = Wallet {
            id: Uuid::new_v4().to_string(),
            owner_id: new.owner_id,
            currency: new.currency,
            balance: Decimal::ZERO,
            available_balance: Decimal::ZERO,
            status: WalletStatus::Active,
            is_default: new.is_default,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO wallets (id, owner_id, currency, balance, available_balance, status, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&wallet.id)
        .bind(&wallet.owner_id)
        .bind(wallet.currency.code())
        .bind(wallet.balance.to_string())
        .bind(wallet.available_balance.to_string())
        .bind(wallet.status.to_string())
        .bind(wallet.is_default as i32)
        .bind(wallet.created_at.to_rfc3339())
        .bind(wallet.updated_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        Ok(wallet)
    }

    /// Read a wallet row
    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Wallet> {
        sqlx::query("SELECT * FROM wallets WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(|row| wallet_from_row(&row))
            .transpose()?
            .ok_or_else(|| StoreError::not_found("Wallet", id))
    }

    /// Read a wallet inside the active unit of work.
    ///
    /// Within an open transaction this is the row as the unit of work sees
    /// it; on a store with row locks this is `SELECT ... FOR UPDATE`.
    pub async fn get_for_update(conn: &mut SqliteConnection, id: &str) -> StoreResult<Wallet> {
        Self::get(conn, id).await
    }

    /// Ids of all wallets in ACTIVE status.
    ///
    /// Only the id column is decoded, so one undecodable wallet row cannot
    /// poison a sweep over the rest; callers resolve each wallet
    /// individually and handle failures per id.
    pub async fn list_active_ids(conn: &mut SqliteConnection) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM wallets WHERE status = 'ACTIVE' ORDER BY created_at")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// All wallets belonging to an owner
    pub async fn list_for_owner(
        conn: &mut SqliteConnection,
        owner_id: &str,
    ) -> StoreResult<Vec<Wallet>> {
        let rows = sqlx::query("SELECT * FROM wallets WHERE owner_id = ? ORDER BY created_at")
            .bind(owner_id)
            .fetch_all(&mut *conn)
            .await?;
        rows.iter().map(wallet_from_row).collect()
    }

    /// Debit a wallet inside the active unit of work.
    ///
    /// Fails with `InsufficientFunds` when the available balance is below
    /// the amount; the wallet is left untouched in that case. Returns the
    /// post-mutation wallet so the caller can record `balance_after` from
    /// the same unit of work.
    pub async fn debit(
        conn: &mut SqliteConnection,
        id: &str,
        amount: Decimal,
    ) -> StoreResult<Wallet> {
        let mut wallet = Self::get_for_update(conn, id).await?;

        if wallet.available_balance < amount {
            return Err(StoreError::InsufficientFunds {
                wallet_id: id.to_string(),
                available: wallet.available_balance,
                required: amount,
            });
        }

        wallet.balance -= amount;
        wallet.available_balance -= amount;
        wallet.updated_at = Utc::now();
        Self::write_balances(conn, &wallet).await?;

        Ok(wallet)
    }

    /// Credit a wallet inside the active unit of work.
    pub async fn credit(
        conn: &mut SqliteConnection,
        id: &str,
        amount: Decimal,
    ) -> StoreResult<Wallet> {
        let mut wallet = Self::get_for_update(conn, id).await?;

        wallet.balance += amount;
        wallet.available_balance += amount;
        wallet.updated_at = Utc::now();
        Self::write_balances(conn, &wallet).await?;

        Ok(wallet)
    }

    /// Transition a wallet's lifecycle status
    pub async fn set_status(
        conn: &mut SqliteConnection,
        id: &str,
        status: WalletStatus,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE wallets SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Wallet", id));
        }
        Ok(())
    }

    async fn write_balances(conn: &mut SqliteConnection, wallet: &Wallet) -> StoreResult<()> {
        sqlx::query(
            "UPDATE wallets SET balance = ?, available_balance = ?, updated_at = ? WHERE id = ?",
        )
        .bind(wallet.balance.to_string())
        .bind(wallet.available_balance.to_string())
        .bind(wallet.updated_at.to_rfc3339())
        .bind(&wallet.id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

pub(crate) fn wallet_from_row(row: &SqliteRow) -> StoreResult<Wallet> {
    let status_text: String = row.get("status");
    let currency_text: String = row.get("currency");
    let is_default: i32 = row.get("is_default");

    Ok(Wallet {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        currency: Currency::from_str(&currency_text)
            .map_err(|_| StoreError::Decode(currency_text))?,
        balance: parse_decimal(row.get("balance"))?,
        available_balance: parse_decimal(row.get("available_balance"))?,
        status: WalletStatus::from_str(&status_text)
            .map_err(|_| StoreError::Decode(status_text))?,
        is_default: is_default != 0,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

pub(crate) fn parse_decimal(text: String) -> StoreResult<Decimal> {
    text.parse().map_err(|_| StoreError::Decode(text))
}

pub(crate) fn parse_timestamp(text: String) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::Decode(text))
}
