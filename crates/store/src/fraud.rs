//! Fraud report store accessor
//!
//! One report per flagged or held transaction; `transaction_id` is UNIQUE
//! so a retried write cannot fan out into duplicate review items.

use chrono::{DateTime, Utc};
use paycore_core::{FraudReportStatus, RiskLevel};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::wallet::parse_timestamp;

/// A persisted review item for a risky transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudReport {
    pub id: String,
    pub transaction_id: String,
    pub score: i64,
    pub level: RiskLevel,
    pub flags: Vec<String>,
    pub status: FraudReportStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for filing a fraud report
#[derive(Debug, Clone)]
pub struct NewFraudReport {
    pub transaction_id: String,
    pub score: i64,
    pub level: RiskLevel,
    pub flags: Vec<String>,
}

/// Repository for the fraud_reports table
pub struct FraudReportRepo;

impl FraudReportRepo {
    /// File a report in OPEN status
    pub async fn insert(
        conn: &mut SqliteConnection,
        new: NewFraudReport,
    ) -> StoreResult<FraudReport> {
        let report = FraudReport {
            id: Uuid::new_v4().to_string(),
            transaction_id: new.transaction_id,
            score: new.score,
            level: new.level,
            flags: new.flags,
            status: FraudReportStatus::Open,
            created_at: Utc::now(),
        };

        let flags_json =
            serde_json::to_string(&report.flags).map_err(|e| StoreError::Decode(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO fraud_reports (id, transaction_id, score, level, flags, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.transaction_id)
        .bind(report.score)
        .bind(report.level.to_string())
        .bind(&flags_json)
        .bind(report.status.to_string())
        .bind(report.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await?;

        Ok(report)
    }

    /// The report attached to a transaction, if any
    pub async fn get_for_transaction(
        conn: &mut SqliteConnection,
        transaction_id: &str,
    ) -> StoreResult<Option<FraudReport>> {
        sqlx::query("SELECT * FROM fraud_reports WHERE transaction_id = ?")
            .bind(transaction_id)
            .fetch_optional(&mut *conn)
            .await?
            .map(|row| report_from_row(&row))
            .transpose()
    }

    /// All reports still awaiting review
    pub async fn list_open(conn: &mut SqliteConnection) -> StoreResult<Vec<FraudReport>> {
        let rows = sqlx::query("SELECT * FROM fraud_reports WHERE status = 'OPEN' ORDER BY created_at")
            .fetch_all(&mut *conn)
            .await?;
        rows.iter().map(report_from_row).collect()
    }

    /// Move a report through the review lifecycle
    pub async fn set_status(
        conn: &mut SqliteConnection,
        id: &str,
        status: FraudReportStatus,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE fraud_reports SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("FraudReport", id));
        }
        Ok(())
    }
}

fn report_from_row(row: &SqliteRow) -> StoreResult<FraudReport> {
    let level: String = row.get("level");
    let status: String = row.get("status");
    let flags: String = row.get("flags");

    Ok(FraudReport {
        id: row.get("id"),
        transaction_id: row.get("transaction_id"),
        score: row.get("score"),
        level: RiskLevel::from_str(&level).map_err(|_| StoreError::Decode(level))?,
        flags: serde_json::from_str(&flags).map_err(|_| StoreError::Decode(flags))?,
        status: FraudReportStatus::from_str(&status).map_err(|_| StoreError::Decode(status))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}
