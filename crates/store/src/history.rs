//! History adapter for the risk engine
//!
//! Builds an `InitiatorSnapshot` from the initiators and transactions
//! tables. Sums and averages run over `Decimal` in Rust; summing TEXT
//! columns in SQLite would go through floats.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use paycore_risk::{InitiatorHistory, InitiatorSnapshot, RiskError};
use rust_decimal::Decimal;

use crate::initiator::InitiatorRepo;
use crate::transaction::TransactionRepo;
use crate::{Store, StoreError};

/// `InitiatorHistory` backed by the store pool.
///
/// Reads run outside any unit of work; the snapshot is an advisory view
/// for scoring, not a balance read.
#[derive(Clone)]
pub struct StoreHistory {
    store: Store,
}

impl StoreHistory {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Completed transactions considered for the historical average
const AVG_WINDOW: i64 = 100;

#[async_trait]
impl InitiatorHistory for StoreHistory {
    async fn snapshot(
        &self,
        initiator_id: &str,
        at: DateTime<Utc>,
    ) -> Result<InitiatorSnapshot, RiskError> {
        let mut conn = self
            .store
            .pool()
            .acquire()
            .await
            .map_err(|e| RiskError::History(e.to_string()))?;

        let initiator = match InitiatorRepo::get(&mut *conn, initiator_id).await {
            Ok(initiator) => initiator,
            Err(StoreError::NotFound { .. }) => {
                return Err(RiskError::UnknownInitiator(initiator_id.to_string()))
            }
            Err(e) => return Err(RiskError::History(e.to_string())),
        };

        let account_age_days = (at - initiator.created_at).num_days().max(0);

        let midnight = at
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(at);
        let day_window_start = midnight.min(at - Duration::hours(1));

        // One query covers both windows; each is re-filtered below
        let recent = TransactionRepo::list_for_initiator_since(
            &mut *conn,
            initiator_id,
            day_window_start,
        )
        .await
        .map_err(|e| RiskError::History(e.to_string()))?;

        let hour_ago = at - Duration::hours(1);
        let tx_count_last_hour = recent
            .iter()
            .filter(|tx| tx.created_at >= hour_ago && tx.created_at <= at)
            .count() as u32;

        let volume_today: Decimal = recent
            .iter()
            .filter(|tx| tx.created_at >= midnight && tx.created_at <= at)
            .map(|tx| tx.amount)
            .sum();

        let completed_count = TransactionRepo::count_completed(&mut *conn, initiator_id)
            .await
            .map_err(|e| RiskError::History(e.to_string()))?;

        // The average runs over a bounded recent window, not the full history
        let completed_amounts =
            TransactionRepo::recent_completed_amounts(&mut *conn, initiator_id, AVG_WINDOW)
                .await
                .map_err(|e| RiskError::History(e.to_string()))?;
        let avg_completed_amount = if completed_amounts.is_empty() {
            None
        } else {
            let total: Decimal = completed_amounts.iter().copied().sum();
            Some(total / Decimal::from(completed_amounts.len() as i64))
        };

        Ok(InitiatorSnapshot {
            account_age_days,
            verified: initiator.verified,
            tx_count_last_hour,
            volume_today,
            completed_count,
            avg_completed_amount,
            failed_auth_recent: initiator.failed_auth_recent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::NewTransaction;
    use paycore_core::{Currency, TransactionStatus, TransactionType};
    use rust_decimal_macros::dec;

    async fn test_store() -> Store {
        let store = Store::in_memory().await.unwrap();
        store.init_schema().await.unwrap();
        store
    }

    async fn seed_completed(store: &Store, reference: &str, amount: Decimal) {
        let mut tx = store.begin().await.unwrap();
        TransactionRepo::insert(
            &mut tx,
            NewTransaction::simple(
                reference,
                TransactionType::Transfer,
                TransactionStatus::Completed,
                "alice",
                amount,
                Currency::Usd,
            ),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_initiator() {
        let store = test_store().await;
        let history = StoreHistory::new(store);

        let result = history.snapshot("ghost", Utc::now()).await;
        assert!(matches!(result, Err(RiskError::UnknownInitiator(_))));
    }

    #[tokio::test]
    async fn test_snapshot_counts_and_averages() {
        let store = test_store().await;
        {
            let mut tx = store.begin().await.unwrap();
            InitiatorRepo::create(&mut tx, "alice", Utc::now() - Duration::days(400))
                .await
                .unwrap();
            InitiatorRepo::set_verified(&mut tx, "alice", true).await.unwrap();
            tx.commit().await.unwrap();
        }
        seed_completed(&store, "ref-1", dec!(100)).await;
        seed_completed(&store, "ref-2", dec!(300)).await;

        let history = StoreHistory::new(store);
        let snapshot = history.snapshot("alice", Utc::now()).await.unwrap();

        assert_eq!(snapshot.account_age_days, 400);
        assert!(snapshot.verified);
        assert_eq!(snapshot.tx_count_last_hour, 2);
        assert_eq!(snapshot.volume_today, dec!(400));
        assert_eq!(snapshot.completed_count, 2);
        assert_eq!(snapshot.avg_completed_amount, Some(dec!(200)));
        assert_eq!(snapshot.failed_auth_recent, 0);
    }

    #[tokio::test]
    async fn test_failed_transactions_excluded_from_average() {
        let store = test_store().await;
        {
            let mut tx = store.begin().await.unwrap();
            InitiatorRepo::create(&mut tx, "alice", Utc::now() - Duration::days(10))
                .await
                .unwrap();
            TransactionRepo::insert(
                &mut tx,
                NewTransaction::simple(
                    "ref-failed",
                    TransactionType::Transfer,
                    TransactionStatus::Failed,
                    "alice",
                    dec!(9999),
                    Currency::Usd,
                ),
            )
            .await
            .unwrap();
            tx.commit().await.unwrap();
        }
        seed_completed(&store, "ref-ok", dec!(50)).await;

        let history = StoreHistory::new(store);
        let snapshot = history.snapshot("alice", Utc::now()).await.unwrap();

        assert_eq!(snapshot.completed_count, 1);
        assert_eq!(snapshot.avg_completed_amount, Some(dec!(50)));
        // velocity counts every attempt, completed or not
        assert_eq!(snapshot.tx_count_last_hour, 2);
    }

    #[tokio::test]
    async fn test_failed_auth_attempts_reach_the_snapshot() {
        let store = test_store().await;
        {
            let mut tx = store.begin().await.unwrap();
            InitiatorRepo::create(&mut tx, "alice", Utc::now() - Duration::days(30))
                .await
                .unwrap();
            for _ in 0..4 {
                InitiatorRepo::record_failed_auth(&mut tx, "alice").await.unwrap();
            }
            tx.commit().await.unwrap();
        }

        let history = StoreHistory::new(store);
        let snapshot = history.snapshot("alice", Utc::now()).await.unwrap();
        assert_eq!(snapshot.failed_auth_recent, 4);
    }

    #[tokio::test]
    async fn test_no_history_yields_empty_snapshot() {
        let store = test_store().await;
        {
            let mut tx = store.begin().await.unwrap();
            InitiatorRepo::create(&mut tx, "bob", Utc::now()).await.unwrap();
            tx.commit().await.unwrap();
        }

        let history = StoreHistory::new(store);
        let snapshot = history.snapshot("bob", Utc::now()).await.unwrap();

        assert_eq!(snapshot.account_age_days, 0);
        assert_eq!(snapshot.tx_count_last_hour, 0);
        assert_eq!(snapshot.volume_today, Decimal::ZERO);
        assert_eq!(snapshot.avg_completed_amount, None);
    }
}
