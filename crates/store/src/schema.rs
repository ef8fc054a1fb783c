//! Schema bootstrap
//!
//! One statement per table, idempotent. On a server-grade store these map
//! to migrations; the shapes are what the core contracts depend on:
//! unique transaction references, append-only ledger entries ordered by
//! `seq`, TEXT decimals.

use sqlx::SqlitePool;

use crate::error::StoreError;

/// Create all tables and indexes
pub async fn init(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wallets (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            currency TEXT NOT NULL,
            balance TEXT NOT NULL DEFAULT '0',
            available_balance TEXT NOT NULL DEFAULT '0',
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            is_default INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_wallets_owner ON wallets(owner_id, currency)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            reference TEXT NOT NULL UNIQUE,
            tx_type TEXT NOT NULL,
            status TEXT NOT NULL,
            from_wallet_id TEXT,
            to_wallet_id TEXT,
            initiator_id TEXT NOT NULL,
            amount TEXT NOT NULL,
            fee TEXT NOT NULL DEFAULT '0',
            currency TEXT NOT NULL,
            target_currency TEXT,
            exchange_rate TEXT,
            converted_amount TEXT,
            risk_score INTEGER NOT NULL DEFAULT 0,
            description TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_initiator ON transactions(initiator_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ledger_entries (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id TEXT NOT NULL,
            wallet_id TEXT NOT NULL,
            amount TEXT NOT NULL,
            balance_after TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_ledger_wallet ON ledger_entries(wallet_id, seq)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fraud_reports (
            id TEXT PRIMARY KEY,
            transaction_id TEXT NOT NULL UNIQUE,
            score INTEGER NOT NULL,
            level TEXT NOT NULL,
            flags TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'OPEN',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS initiators (
            id TEXT PRIMARY KEY,
            verified INTEGER NOT NULL DEFAULT 0,
            failed_auth_recent INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
