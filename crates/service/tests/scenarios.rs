//! End-to-end movement scenarios over in-memory SQLite

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use paycore_audit::{AuditAction, MemoryAuditSink};
use paycore_core::{AdjustmentDirection, Currency, MetadataKey, TransactionStatus};
use paycore_ledger::verify_wallet;
use paycore_risk::{
    InitiatorHistory, InitiatorSnapshot, RiskConfig, RiskError, RiskScorer,
};
use paycore_service::{
    AdjustmentRequest, ConversionRequest, FixedRateLookup, ServiceConfig, ServiceError,
    TransactionService, TransferRequest,
};
use paycore_store::{
    FraudReportRepo, InitiatorRepo, NewTransaction, NewWallet, Store, StoreHistory,
    TransactionRepo, Wallet, WalletRepo,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use paycore_core::{TransactionType, WalletStatus};

struct Harness {
    store: Store,
    service: TransactionService,
    audit: Arc<MemoryAuditSink>,
}

async fn harness() -> Harness {
    harness_with(ServiceConfig::default()).await
}

async fn harness_with(config: ServiceConfig) -> Harness {
    let store = Store::in_memory().await.unwrap();
    store.init_schema().await.unwrap();

    let history = StoreHistory::new(store.clone());
    let scorer = RiskScorer::new(RiskConfig::default(), Arc::new(history));
    let rates = Arc::new(
        FixedRateLookup::new()
            .with_rate(Currency::Usd, Currency::Eur, dec!(0.9))
            .with_rate(Currency::Usd, Currency::Btc, dec!(0.00002)),
    );
    let audit = Arc::new(MemoryAuditSink::new());
    let service = TransactionService::new(
        store.clone(),
        scorer,
        rates,
        audit.clone(),
        config,
    );

    Harness {
        store,
        service,
        audit,
    }
}

impl Harness {
    async fn seed_initiator(&self, id: &str, age_days: i64, verified: bool) {
        let mut tx = self.store.begin().await.unwrap();
        InitiatorRepo::create(&mut tx, id, Utc::now() - Duration::days(age_days))
            .await
            .unwrap();
        if verified {
            InitiatorRepo::set_verified(&mut tx, id, true).await.unwrap();
        }
        tx.commit().await.unwrap();
    }

    /// Wallet funded through the deposit path so its ledger stays consistent.
    /// The deposit is initiated by "ops" to keep test initiators' history clean.
    async fn seed_wallet(&self, owner: &str, currency: Currency, balance: Decimal) -> Wallet {
        let mut tx = self.store.begin().await.unwrap();
        let wallet = WalletRepo::create(
            &mut tx,
            NewWallet {
                owner_id: owner.to_string(),
                currency,
                is_default: true,
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        if !balance.is_zero() {
            self.service
                .deposit(&wallet.id, "ops", balance, None)
                .await
                .unwrap();
        }
        wallet
    }

    /// Completed prior transactions shaping the initiator's risk history
    async fn seed_priors(&self, initiator: &str, count: usize, amount: Decimal) {
        let mut tx = self.store.begin().await.unwrap();
        for i in 0..count {
            TransactionRepo::insert(
                &mut tx,
                NewTransaction::simple(
                    format!("prior-{}-{}", initiator, i),
                    TransactionType::Transfer,
                    TransactionStatus::Completed,
                    initiator,
                    amount,
                    Currency::Usd,
                ),
            )
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();
    }

    async fn wallet(&self, id: &str) -> Wallet {
        let mut conn = self.store.pool().acquire().await.unwrap();
        WalletRepo::get(&mut *conn, id).await.unwrap()
    }

    async fn entries(&self, transaction_id: &str) -> Vec<paycore_ledger::LedgerEntry> {
        let mut conn = self.store.pool().acquire().await.unwrap();
        paycore_ledger::entries_for_transaction(&mut *conn, transaction_id)
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn scenario_a_low_risk_transfer_completes() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(50)).await;

    let record = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(200)))
        .await
        .unwrap();

    assert_eq!(record.status, TransactionStatus::Completed);
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(800));
    assert_eq!(h.wallet(&w2.id).await.balance, dec!(250));

    // two entries summing to zero
    let entries = h.entries(&record.id).await;
    assert_eq!(entries.len(), 2);
    let sum: Decimal = entries.iter().map(|e| e.amount).sum();
    assert_eq!(sum, Decimal::ZERO);

    for wallet_id in [&w1.id, &w2.id] {
        let verification = verify_wallet(h.store.pool(), wallet_id).await.unwrap();
        assert!(verification.consistent, "wallet {} drifted", wallet_id);
    }
}

#[tokio::test]
async fn scenario_b_insufficient_funds_mutates_nothing() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(50)).await;

    let result = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(1500)))
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::InsufficientFunds { available, required })
            if available == dec!(1000) && required == dec!(1500)
    ));
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(1000));
    assert_eq!(h.wallet(&w2.id).await.balance, dec!(50));

    // the funding deposits are the only rows
    let mut conn = h.store.pool().acquire().await.unwrap();
    let listed = TransactionRepo::list_for_wallet(&mut *conn, &w1.id, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].tx_type, TransactionType::Deposit);
}

#[tokio::test]
async fn scenario_c_high_risk_transfer_blocks_before_mutation() {
    let h = harness().await;
    // young unverified account with a burst of small transactions
    h.seed_initiator("alice", 2, false).await;
    h.seed_priors("alice", 12, dec!(900)).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(50000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(0)).await;

    let result = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(30000)))
        .await;

    let score = match result {
        Err(ServiceError::RiskBlocked { score }) => score,
        other => panic!("expected RiskBlocked, got {:?}", other.map(|r| r.status)),
    };
    assert!(score >= 90);

    assert_eq!(h.wallet(&w1.id).await.balance, dec!(50000));
    assert_eq!(h.wallet(&w2.id).await.balance, Decimal::ZERO);

    let records = h.audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, AuditAction::RiskBlocked);
    assert_eq!(records[0].initiator_id, "alice");
}

#[tokio::test]
async fn scenario_d_moderate_risk_transfer_is_flagged_debit_only() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    h.seed_priors("alice", 6, dec!(3000)).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(20000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(100)).await;

    let record = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(12000)))
        .await
        .unwrap();

    assert_eq!(record.status, TransactionStatus::Flagged);
    assert!(record.risk_score >= 40 && record.risk_score < 70);

    // sender debited, recipient untouched
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(8000));
    assert_eq!(h.wallet(&w2.id).await.balance, dec!(100));

    let entries = h.entries(&record.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, dec!(-12000));

    let mut conn = h.store.pool().acquire().await.unwrap();
    let report = FraudReportRepo::get_for_transaction(&mut *conn, &record.id)
        .await
        .unwrap()
        .expect("flagged transfer must file a fraud report");
    assert_eq!(report.score, record.risk_score);
    assert!(!report.flags.is_empty());
}

#[tokio::test]
async fn scenario_e_admin_credit_adjustment() {
    let h = harness().await;
    let w3 = h.seed_wallet("carol", Currency::Usd, dec!(500)).await;

    let record = h
        .service
        .adjust_balance(AdjustmentRequest {
            admin_id: "admin-1".to_string(),
            wallet_id: w3.id.clone(),
            amount: dec!(300),
            direction: AdjustmentDirection::Credit,
            reason: "promo".to_string(),
            client_ip: Some("10.0.0.9".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(record.tx_type, TransactionType::Adjustment);
    assert_eq!(record.status, TransactionStatus::Completed);
    assert_eq!(h.wallet(&w3.id).await.balance, dec!(800));

    let entries = h.entries(&record.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, dec!(300));

    let records = h.audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, AuditAction::BalanceAdjusted);
    assert_eq!(records[0].details["reason"], "promo");

    let verification = verify_wallet(h.store.pool(), &w3.id).await.unwrap();
    assert!(verification.consistent);
}

#[tokio::test]
async fn adjustment_debit_respects_available_balance() {
    let h = harness().await;
    let w = h.seed_wallet("carol", Currency::Usd, dec!(500)).await;

    let result = h
        .service
        .adjust_balance(AdjustmentRequest {
            admin_id: "admin-1".to_string(),
            wallet_id: w.id.clone(),
            amount: dec!(600),
            direction: AdjustmentDirection::Debit,
            reason: "chargeback".to_string(),
            client_ip: None,
        })
        .await;

    assert!(matches!(result, Err(ServiceError::InsufficientFunds { .. })));
    assert_eq!(h.wallet(&w.id).await.balance, dec!(500));
    assert!(h.audit.records().is_empty());
}

#[tokio::test]
async fn adjustment_requires_reason() {
    let h = harness().await;
    let w = h.seed_wallet("carol", Currency::Usd, dec!(500)).await;

    let result = h
        .service
        .adjust_balance(AdjustmentRequest {
            admin_id: "admin-1".to_string(),
            wallet_id: w.id.clone(),
            amount: dec!(10),
            direction: AdjustmentDirection::Credit,
            reason: "   ".to_string(),
            client_ip: None,
        })
        .await;

    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn retried_reference_settles_at_most_once() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(0)).await;

    let request = TransferRequest::new(&w1.id, &w2.id, "alice", dec!(200))
        .with_reference("order-42");

    let first = h.service.create_transfer(request.clone()).await.unwrap();
    let second = h.service.create_transfer(request).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(800));
    assert_eq!(h.wallet(&w2.id).await.balance, dec!(200));

    let entries = h.entries(&first.id).await;
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn cross_currency_transfer_is_rejected() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let usd = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let eur = h.seed_wallet("bob", Currency::Eur, dec!(0)).await;

    let result = h
        .service
        .create_transfer(TransferRequest::new(&usd.id, &eur.id, "alice", dec!(100)))
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::CurrencyMismatch { from: Currency::Usd, to: Currency::Eur })
    ));
}

#[tokio::test]
async fn frozen_wallet_rejects_movement() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(0)).await;

    let mut tx = h.store.begin().await.unwrap();
    WalletRepo::set_status(&mut tx, &w2.id, WalletStatus::Frozen).await.unwrap();
    tx.commit().await.unwrap();

    let result = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(100)))
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
}

#[tokio::test]
async fn transfer_from_foreign_wallet_reads_as_not_found() {
    let h = harness().await;
    h.seed_initiator("mallory", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("mallory", Currency::Usd, dec!(0)).await;

    let result = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "mallory", dec!(100)))
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(1000));
}

#[tokio::test]
async fn conversion_credits_at_rate_with_metadata() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let usd = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let eur = h.seed_wallet("alice", Currency::Eur, dec!(0)).await;

    let record = h
        .service
        .convert(ConversionRequest::new(&usd.id, &eur.id, "alice", dec!(100)))
        .await
        .unwrap();

    assert_eq!(record.tx_type, TransactionType::Conversion);
    assert_eq!(record.exchange_rate, Some(dec!(0.9)));
    assert_eq!(record.converted_amount, Some(dec!(90.00)));
    assert_eq!(record.metadata.get_str(MetadataKey::ExchangeRate), Some("0.9"));

    assert_eq!(h.wallet(&usd.id).await.balance, dec!(900));
    assert_eq!(h.wallet(&eur.id).await.balance, dec!(90.00));

    // both sides stay ledger-consistent despite asymmetric amounts
    for wallet_id in [&usd.id, &eur.id] {
        let verification = verify_wallet(h.store.pool(), wallet_id).await.unwrap();
        assert!(verification.consistent);
    }
}

#[tokio::test]
async fn conversion_without_rate_fails_clean() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let usd = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let gbp = h.seed_wallet("alice", Currency::Gbp, dec!(0)).await;

    let result = h
        .service
        .convert(ConversionRequest::new(&usd.id, &gbp.id, "alice", dec!(100)))
        .await;

    assert!(matches!(result, Err(ServiceError::RateUnavailable { .. })));
    assert_eq!(h.wallet(&usd.id).await.balance, dec!(1000));
}

#[tokio::test]
async fn crypto_buy_moves_fiat_into_crypto() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let usd = h.seed_wallet("alice", Currency::Usd, dec!(5000)).await;
    let btc = h.seed_wallet("alice", Currency::Btc, dec!(0)).await;

    let record = h
        .service
        .crypto_buy(ConversionRequest::new(&usd.id, &btc.id, "alice", dec!(5000)))
        .await
        .unwrap();

    assert_eq!(record.tx_type, TransactionType::CryptoBuy);
    assert_eq!(h.wallet(&usd.id).await.balance, Decimal::ZERO);
    assert_eq!(h.wallet(&btc.id).await.balance, dec!(0.10));
}

#[tokio::test]
async fn withdrawal_writes_single_debit_entry() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let w = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;

    let record = h
        .service
        .withdraw(&w.id, "alice", dec!(400), None)
        .await
        .unwrap();

    assert_eq!(record.status, TransactionStatus::Completed);
    assert_eq!(h.wallet(&w.id).await.balance, dec!(600));

    let entries = h.entries(&record.id).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, dec!(-400));
}

#[tokio::test]
async fn pos_payment_settles_like_a_transfer() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(100)).await;
    let merchant = h.seed_wallet("shop", Currency::Usd, dec!(0)).await;

    let record = h
        .service
        .pos_payment(TransferRequest::new(&w1.id, &merchant.id, "alice", dec!(25)))
        .await
        .unwrap();

    assert_eq!(record.tx_type, TransactionType::PosPayment);
    assert_eq!(h.wallet(&merchant.id).await.balance, dec!(25));
}

#[tokio::test]
async fn access_control_hides_unrelated_transactions() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(0)).await;

    let record = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(100)))
        .await
        .unwrap();

    // initiator and recipient's owner both see it
    assert!(h.service.get_transaction("alice", &record.id).await.is_ok());
    assert!(h.service.get_transaction("bob", &record.id).await.is_ok());

    // strangers get NotFound, not a permission error
    let result = h.service.get_transaction("mallory", &record.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let result = h.service.list_for_wallet("mallory", &w1.id, 10).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

/// History seam that never answers, to drive the risk deadline
struct StalledHistory;

#[async_trait]
impl InitiatorHistory for StalledHistory {
    async fn snapshot(
        &self,
        _initiator_id: &str,
        _at: DateTime<Utc>,
    ) -> Result<InitiatorSnapshot, RiskError> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(InitiatorSnapshot::default())
    }
}

#[tokio::test]
async fn risk_timeout_fails_safe_to_hold() {
    let store = Store::in_memory().await.unwrap();
    store.init_schema().await.unwrap();

    let scorer = RiskScorer::new(RiskConfig::default(), Arc::new(StalledHistory));
    let audit = Arc::new(MemoryAuditSink::new());
    let config = ServiceConfig {
        risk_timeout_ms: 50,
        ..ServiceConfig::default()
    };
    let service = TransactionService::new(
        store.clone(),
        scorer,
        Arc::new(FixedRateLookup::new()),
        audit.clone(),
        config,
    );
    let h = Harness {
        store,
        service,
        audit,
    };

    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(0)).await;

    let record = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(200)))
        .await
        .unwrap();

    // timed out is never ALLOW: sender debited, recipient withheld
    assert_eq!(record.status, TransactionStatus::Flagged);
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(800));
    assert_eq!(h.wallet(&w2.id).await.balance, Decimal::ZERO);

    let held: Vec<_> = h
        .audit
        .records()
        .into_iter()
        .filter(|r| r.action == AuditAction::TransactionHeld)
        .collect();
    assert_eq!(held.len(), 1);
}

#[tokio::test]
async fn reference_reused_by_another_caller_is_rejected() {
    let h = harness().await;
    h.seed_initiator("alice", 400, true).await;
    h.seed_initiator("mallory", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(0)).await;
    let m1 = h.seed_wallet("mallory", Currency::Usd, dec!(1000)).await;
    let m2 = h.seed_wallet("mallory", Currency::Usd, dec!(0)).await;

    let settled = h
        .service
        .create_transfer(
            TransferRequest::new(&w1.id, &w2.id, "alice", dec!(200)).with_reference("order-42"),
        )
        .await
        .unwrap();

    // someone else's settled reference is a collision, not a replay
    let result = h
        .service
        .create_transfer(
            TransferRequest::new(&m1.id, &m2.id, "mallory", dec!(50)).with_reference("order-42"),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    // the same caller retrying with different terms is a collision too
    let result = h
        .service
        .create_transfer(
            TransferRequest::new(&w1.id, &w2.id, "alice", dec!(300)).with_reference("order-42"),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    // nothing moved beyond the original settlement
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(800));
    assert_eq!(h.wallet(&m1.id).await.balance, dec!(1000));
    assert_eq!(h.wallet(&m2.id).await.balance, Decimal::ZERO);
    assert_eq!(settled.initiator_id, "alice");
}

#[tokio::test]
async fn nonzero_fee_is_ledgered_as_its_own_entry() {
    let h = harness_with(ServiceConfig {
        default_fee: dec!(1.50),
        ..ServiceConfig::default()
    })
    .await;
    h.seed_initiator("alice", 400, true).await;
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(500)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(0)).await;

    let record = h
        .service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(100)))
        .await
        .unwrap();

    assert_eq!(record.status, TransactionStatus::Completed);
    assert_eq!(record.fee, dec!(1.50));
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(398.50));
    assert_eq!(h.wallet(&w2.id).await.balance, dec!(100));

    // transfer debit, fee debit, recipient credit
    let entries = h.entries(&record.id).await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].amount, dec!(-100));
    assert_eq!(entries[0].balance_after, dec!(400.00));
    assert_eq!(entries[1].amount, dec!(-1.50));
    assert_eq!(entries[1].balance_after, dec!(398.50));
    assert_eq!(entries[1].description.as_deref(), Some("fee"));
    assert_eq!(entries[2].amount, dec!(100));

    for wallet_id in [&w1.id, &w2.id] {
        let verification = verify_wallet(h.store.pool(), wallet_id).await.unwrap();
        assert!(verification.consistent, "wallet {} drifted", wallet_id);
    }
}

#[tokio::test]
async fn adjustment_rejects_inactive_wallet() {
    let h = harness().await;
    let w = h.seed_wallet("carol", Currency::Usd, dec!(500)).await;

    let mut tx = h.store.begin().await.unwrap();
    WalletRepo::set_status(&mut tx, &w.id, WalletStatus::Frozen).await.unwrap();
    tx.commit().await.unwrap();

    let result = h
        .service
        .adjust_balance(AdjustmentRequest {
            admin_id: "admin-1".to_string(),
            wallet_id: w.id.clone(),
            amount: dec!(100),
            direction: AdjustmentDirection::Credit,
            reason: "promo".to_string(),
            client_ip: None,
        })
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    let after = h.wallet(&w.id).await;
    assert_eq!(after.balance, dec!(500));
    assert!(h.audit.records().is_empty());
}

/// History seam that freezes the recipient while the score is computed,
/// standing in for any status change racing the movement
struct FreezingHistory {
    store: Store,
    wallet_id: String,
}

#[async_trait]
impl InitiatorHistory for FreezingHistory {
    async fn snapshot(
        &self,
        _initiator_id: &str,
        _at: DateTime<Utc>,
    ) -> Result<InitiatorSnapshot, RiskError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| RiskError::History(e.to_string()))?;
        WalletRepo::set_status(&mut tx, &self.wallet_id, WalletStatus::Frozen)
            .await
            .map_err(|e| RiskError::History(e.to_string()))?;
        tx.commit()
            .await
            .map_err(|e| RiskError::History(e.to_string()))?;

        Ok(InitiatorSnapshot {
            account_age_days: 400,
            verified: true,
            ..InitiatorSnapshot::default()
        })
    }
}

#[tokio::test]
async fn wallet_frozen_during_risk_check_stops_the_movement() {
    let store = Store::in_memory().await.unwrap();
    store.init_schema().await.unwrap();

    let audit = Arc::new(MemoryAuditSink::new());
    let seed_service = TransactionService::new(
        store.clone(),
        RiskScorer::new(RiskConfig::default(), Arc::new(StalledHistory)),
        Arc::new(FixedRateLookup::new()),
        audit.clone(),
        ServiceConfig::default(),
    );
    let h = Harness {
        store: store.clone(),
        service: seed_service,
        audit: audit.clone(),
    };
    let w1 = h.seed_wallet("alice", Currency::Usd, dec!(1000)).await;
    let w2 = h.seed_wallet("bob", Currency::Usd, dec!(0)).await;

    let history = FreezingHistory {
        store: store.clone(),
        wallet_id: w2.id.clone(),
    };
    let service = TransactionService::new(
        store.clone(),
        RiskScorer::new(RiskConfig::default(), Arc::new(history)),
        Arc::new(FixedRateLookup::new()),
        audit,
        ServiceConfig::default(),
    );

    let result = service
        .create_transfer(TransferRequest::new(&w1.id, &w2.id, "alice", dec!(100)))
        .await;

    // pre-read saw both wallets ACTIVE; the unit of work must not
    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    assert_eq!(h.wallet(&w1.id).await.balance, dec!(1000));
    assert_eq!(h.wallet(&w2.id).await.balance, Decimal::ZERO);
}
