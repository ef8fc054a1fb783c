//! Initiator profile store accessor
//!
//! The minimal identity facts the risk engine needs: verification state,
//! recent authentication failures, and account age via `created_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::error::{StoreError, StoreResult};
use crate::wallet::parse_timestamp;

/// An actor who can start transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiator {
    pub id: String,
    pub verified: bool,
    /// Failed authentication attempts since the last successful login
    pub failed_auth_recent: u32,
    pub created_at: DateTime<Utc>,
}

/// Repository for the initiators table
pub struct InitiatorRepo;

impl InitiatorRepo {
    /// Register an initiator, unverified by default
    pub async fn create(
        conn: &mut SqliteConnection,
        id: &str,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Initiator> {
        let initiator = Initiator {
            id: id.to_string(),
            verified: false,
            failed_auth_recent: 0,
            created_at,
        };

        sqlx::query(
            "INSERT INTO initiators (id, verified, failed_auth_recent, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&initiator.id)
        .bind(initiator.verified as i32)
        .bind(initiator.failed_auth_recent)
        .bind(initiator.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        Ok(initiator)
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> StoreResult<Initiator> {
        sqlx::query("SELECT * FROM initiators WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .map(|row| initiator_from_row(&row))
            .transpose()?
            .ok_or_else(|| StoreError::not_found("Initiator", id))
    }

    pub async fn set_verified(
        conn: &mut SqliteConnection,
        id: &str,
        verified: bool,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE initiators SET verified = ? WHERE id = ?")
            .bind(verified as i32)
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Initiator", id));
        }
        Ok(())
    }

    /// Count one failed authentication attempt
    pub async fn record_failed_auth(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE initiators SET failed_auth_recent = failed_auth_recent + 1 WHERE id = ?",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Initiator", id));
        }
        Ok(())
    }

    /// Clear the attempt counter, e.g. after a successful login
    pub async fn reset_failed_auth(conn: &mut SqliteConnection, id: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE initiators SET failed_auth_recent = 0 WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Initiator", id));
        }
        Ok(())
    }
}

fn initiator_from_row(row: &SqliteRow) -> StoreResult<Initiator> {
    let verified: i32 = row.get("verified");
    let failed_auth_recent: i64 = row.get("failed_auth_recent");

    Ok(Initiator {
        id: row.get("id"),
        verified: verified != 0,
        failed_auth_recent: failed_auth_recent.max(0) as u32,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}
