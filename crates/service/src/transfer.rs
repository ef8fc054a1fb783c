//! Transfer orchestration - the canonical money movement
//!
//! Every other movement type specializes this template: validate, assess
//! risk before anything mutates, then one unit of work covering wallet
//! mutation, transaction row, ledger entries and fraud report.

use paycore_audit::{AuditAction, AuditRecord, AuditSink};
use paycore_core::{
    Amount, Currency, RiskRecommendation, TransactionStatus, TransactionType, TxMetadata,
    WalletStatus,
};
use paycore_ledger::{record_entry, NewEntry};
use paycore_risk::{ProposedTransfer, RiskAssessment, RiskScorer};
use paycore_store::{
    FraudReportRepo, NewFraudReport, NewTransaction, Store, StoreError, TransactionRecord,
    TransactionRepo, Wallet, WalletRepo,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::rate::RateLookup;

/// A wallet-to-wallet movement request
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from_wallet_id: String,
    pub to_wallet_id: String,
    pub initiator_id: String,
    pub amount: Decimal,
    pub description: Option<String>,
    /// Idempotency key; generated when absent
    pub reference: Option<String>,
    pub metadata: TxMetadata,
}

impl TransferRequest {
    pub fn new(
        from_wallet_id: impl Into<String>,
        to_wallet_id: impl Into<String>,
        initiator_id: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            from_wallet_id: from_wallet_id.into(),
            to_wallet_id: to_wallet_id.into(),
            initiator_id: initiator_id.into(),
            amount,
            description: None,
            reference: None,
            metadata: TxMetadata::new(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Orchestrates all money movements
pub struct TransactionService {
    pub(crate) store: Store,
    pub(crate) scorer: RiskScorer,
    pub(crate) rates: Arc<dyn RateLookup>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) config: ServiceConfig,
}

impl TransactionService {
    pub fn new(
        store: Store,
        scorer: RiskScorer,
        rates: Arc<dyn RateLookup>,
        audit: Arc<dyn AuditSink>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            scorer,
            rates,
            audit,
            config,
        }
    }

    /// Move funds between two same-currency wallets.
    ///
    /// BLOCK fails the call before any mutation. HOLD and FLAG both land
    /// the transaction in FLAGGED: the source is debited, the destination
    /// stays uncredited until the flag is resolved out of band.
    pub async fn create_transfer(
        &self,
        request: TransferRequest,
    ) -> ServiceResult<TransactionRecord> {
        self.transfer_like(request, TransactionType::Transfer).await
    }

    /// Point-of-sale payment: transfer semantics under its own type
    pub async fn pos_payment(&self, request: TransferRequest) -> ServiceResult<TransactionRecord> {
        self.transfer_like(request, TransactionType::PosPayment).await
    }

    pub(crate) async fn transfer_like(
        &self,
        request: TransferRequest,
        tx_type: TransactionType,
    ) -> ServiceResult<TransactionRecord> {
        positive_amount(request.amount)?;
        let fee = self.config.default_fee;
        let required = request.amount + fee;

        let (source, destination) = {
            let mut conn = self.store.pool().acquire().await?;
            let source = WalletRepo::get(&mut *conn, &request.from_wallet_id).await?;
            let destination = WalletRepo::get(&mut *conn, &request.to_wallet_id).await?;
            (source, destination)
        };

        // Ownership failures read as NotFound so callers cannot probe
        // for other users' wallet ids
        if source.owner_id != request.initiator_id {
            return Err(ServiceError::NotFound(format!(
                "Wallet {}",
                request.from_wallet_id
            )));
        }
        ensure_active(&source)?;
        ensure_active(&destination)?;
        if source.currency != destination.currency {
            return Err(ServiceError::CurrencyMismatch {
                from: source.currency,
                to: destination.currency,
            });
        }
        if source.available_balance < required {
            return Err(ServiceError::InsufficientFunds {
                available: source.available_balance,
                required,
            });
        }

        let assessment = self
            .assess(&request.initiator_id, request.amount, &source.currency, tx_type)
            .await?;
        self.check_blocked(&assessment, &request.initiator_id, request.amount, &source.currency)
            .await?;

        let status = resolve_status(&assessment);
        let reference = request
            .reference
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut tx = self.store.begin().await?;

        if let Some(existing) = TransactionRepo::find_by_reference(&mut tx, &reference).await? {
            return claim_existing(existing, &request.initiator_id, request.amount, tx_type);
        }

        // Statuses may have changed since the pre-read; re-assert inside
        // the unit of work before anything mutates
        let source = WalletRepo::get_for_update(&mut tx, &source.id).await?;
        ensure_active(&source)?;
        let destination = WalletRepo::get_for_update(&mut tx, &destination.id).await?;
        ensure_active(&destination)?;

        let debited = WalletRepo::debit(&mut tx, &source.id, required).await?;

        let record = match TransactionRepo::insert(
            &mut tx,
            NewTransaction {
                reference,
                tx_type,
                status,
                from_wallet_id: Some(source.id.clone()),
                to_wallet_id: Some(destination.id.clone()),
                initiator_id: request.initiator_id.clone(),
                amount: request.amount,
                fee,
                currency: source.currency.clone(),
                target_currency: None,
                exchange_rate: None,
                converted_amount: None,
                risk_score: assessment.score as i64,
                description: request.description.clone(),
                metadata: request.metadata.clone(),
            },
        )
        .await
        {
            Ok(record) => record,
            // Lost a reference race to a concurrent retry; surface the
            // winner's transaction instead of applying twice
            Err(StoreError::DuplicateReference(reference)) => {
                tx.rollback().await?;
                return self
                    .settled_by_reference(&reference, &request.initiator_id, request.amount, tx_type)
                    .await;
            }
            Err(e) => return Err(e.into()),
        };

        // The transfer debit and the fee debit are separate entries so
        // every balance change is attributed; together they explain the
        // full wallet debit of amount + fee
        record_entry(
            &mut tx,
            NewEntry::debit(&record.id, &source.id, request.amount, debited.balance + fee),
        )
        .await?;
        if !fee.is_zero() {
            record_entry(
                &mut tx,
                NewEntry::debit(&record.id, &source.id, fee, debited.balance)
                    .with_description("fee"),
            )
            .await?;
        }

        if status == TransactionStatus::Completed {
            let credited = WalletRepo::credit(&mut tx, &destination.id, request.amount).await?;
            record_entry(
                &mut tx,
                NewEntry::credit(&record.id, &destination.id, request.amount, credited.balance),
            )
            .await?;
        }

        if assessment.requires_fraud_report() {
            FraudReportRepo::insert(
                &mut tx,
                NewFraudReport {
                    transaction_id: record.id.clone(),
                    score: assessment.score as i64,
                    level: assessment.level,
                    flags: assessment.flags.clone(),
                },
            )
            .await?;
        }

        tx.commit().await?;

        if assessment.recommendation == RiskRecommendation::Hold {
            self.emit_audit(
                AuditRecord::new(
                    AuditAction::TransactionHeld,
                    &request.initiator_id,
                    request.amount,
                    source.currency.clone(),
                )
                .with_reference(&record.reference)
                .with_details(serde_json::json!({ "score": assessment.score })),
            )
            .await;
        }

        tracing::info!(
            transaction = %record.id,
            tx_type = %tx_type,
            status = %status,
            amount = %request.amount,
            "movement settled"
        );
        Ok(record)
    }

    /// Credit a wallet from an external funding source.
    ///
    /// The source is not modeled as a wallet; the ledger carries a single
    /// credit entry. No risk gate: funds entering the system are scored
    /// when they move, not when they arrive.
    pub async fn deposit(
        &self,
        wallet_id: &str,
        initiator_id: &str,
        amount: Decimal,
        reference: Option<String>,
    ) -> ServiceResult<TransactionRecord> {
        positive_amount(amount)?;

        let wallet = {
            let mut conn = self.store.pool().acquire().await?;
            WalletRepo::get(&mut *conn, wallet_id).await?
        };
        ensure_active(&wallet)?;

        let reference = reference.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut tx = self.store.begin().await?;

        if let Some(existing) = TransactionRepo::find_by_reference(&mut tx, &reference).await? {
            return claim_existing(existing, initiator_id, amount, TransactionType::Deposit);
        }

        let wallet = WalletRepo::get_for_update(&mut tx, wallet_id).await?;
        ensure_active(&wallet)?;

        let credited = WalletRepo::credit(&mut tx, wallet_id, amount).await?;

        let mut new = NewTransaction::simple(
            reference,
            TransactionType::Deposit,
            TransactionStatus::Completed,
            initiator_id,
            amount,
            wallet.currency.clone(),
        );
        new.to_wallet_id = Some(wallet_id.to_string());
        let record = match TransactionRepo::insert(&mut tx, new).await {
            Ok(record) => record,
            Err(StoreError::DuplicateReference(reference)) => {
                tx.rollback().await?;
                return self
                    .settled_by_reference(&reference, initiator_id, amount, TransactionType::Deposit)
                    .await;
            }
            Err(e) => return Err(e.into()),
        };

        record_entry(
            &mut tx,
            NewEntry::credit(&record.id, wallet_id, amount, credited.balance),
        )
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// Debit a wallet toward an external destination.
    ///
    /// Runs the same risk gate as transfers; a flagged withdrawal still
    /// debits (the shape is debit-only either way) but lands FLAGGED for
    /// review before the funds leave the institution.
    pub async fn withdraw(
        &self,
        wallet_id: &str,
        initiator_id: &str,
        amount: Decimal,
        reference: Option<String>,
    ) -> ServiceResult<TransactionRecord> {
        positive_amount(amount)?;
        let fee = self.config.default_fee;
        let required = amount + fee;

        let wallet = {
            let mut conn = self.store.pool().acquire().await?;
            WalletRepo::get(&mut *conn, wallet_id).await?
        };
        if wallet.owner_id != initiator_id {
            return Err(ServiceError::NotFound(format!("Wallet {}", wallet_id)));
        }
        ensure_active(&wallet)?;
        if wallet.available_balance < required {
            return Err(ServiceError::InsufficientFunds {
                available: wallet.available_balance,
                required,
            });
        }

        let assessment = self
            .assess(initiator_id, amount, &wallet.currency, TransactionType::Withdrawal)
            .await?;
        self.check_blocked(&assessment, initiator_id, amount, &wallet.currency)
            .await?;
        let status = resolve_status(&assessment);

        let reference = reference.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut tx = self.store.begin().await?;

        if let Some(existing) = TransactionRepo::find_by_reference(&mut tx, &reference).await? {
            return claim_existing(existing, initiator_id, amount, TransactionType::Withdrawal);
        }

        let wallet = WalletRepo::get_for_update(&mut tx, wallet_id).await?;
        ensure_active(&wallet)?;

        let debited = WalletRepo::debit(&mut tx, wallet_id, required).await?;

        let mut new = NewTransaction::simple(
            reference,
            TransactionType::Withdrawal,
            status,
            initiator_id,
            amount,
            wallet.currency.clone(),
        );
        new.from_wallet_id = Some(wallet_id.to_string());
        new.fee = fee;
        new.risk_score = assessment.score as i64;
        let record = match TransactionRepo::insert(&mut tx, new).await {
            Ok(record) => record,
            Err(StoreError::DuplicateReference(reference)) => {
                tx.rollback().await?;
                return self
                    .settled_by_reference(
                        &reference,
                        initiator_id,
                        amount,
                        TransactionType::Withdrawal,
                    )
                    .await;
            }
            Err(e) => return Err(e.into()),
        };

        record_entry(
            &mut tx,
            NewEntry::debit(&record.id, wallet_id, amount, debited.balance + fee),
        )
        .await?;
        if !fee.is_zero() {
            record_entry(
                &mut tx,
                NewEntry::debit(&record.id, wallet_id, fee, debited.balance).with_description("fee"),
            )
            .await?;
        }

        if assessment.requires_fraud_report() {
            FraudReportRepo::insert(
                &mut tx,
                NewFraudReport {
                    transaction_id: record.id.clone(),
                    score: assessment.score as i64,
                    level: assessment.level,
                    flags: assessment.flags.clone(),
                },
            )
            .await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    /// Run the risk assessment with the configured deadline.
    ///
    /// A timeout is never ALLOW; it yields the fail-safe HOLD assessment.
    pub(crate) async fn assess(
        &self,
        initiator_id: &str,
        amount: Decimal,
        currency: &Currency,
        tx_type: TransactionType,
    ) -> ServiceResult<RiskAssessment> {
        let proposed = ProposedTransfer::new(initiator_id, amount, currency.clone(), tx_type);
        match tokio::time::timeout(self.config.risk_timeout(), self.scorer.assess(&proposed)).await
        {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(
                    initiator = %initiator_id,
                    timeout_ms = self.config.risk_timeout_ms,
                    "risk assessment timed out, holding transaction"
                );
                Ok(RiskAssessment::timed_out())
            }
        }
    }

    /// Fail on BLOCK before any mutation, leaving an audit record
    pub(crate) async fn check_blocked(
        &self,
        assessment: &RiskAssessment,
        initiator_id: &str,
        amount: Decimal,
        currency: &Currency,
    ) -> ServiceResult<()> {
        if !assessment.is_blocked() {
            return Ok(());
        }
        self.emit_audit(
            AuditRecord::new(AuditAction::RiskBlocked, initiator_id, amount, currency.clone())
                .with_details(serde_json::json!({
                    "score": assessment.score,
                    "flags": assessment.flags,
                })),
        )
        .await;
        Err(ServiceError::RiskBlocked {
            score: assessment.score,
        })
    }

    /// Fetch the transaction that won a reference race, provided it was
    /// the same request retried
    pub(crate) async fn settled_by_reference(
        &self,
        reference: &str,
        initiator_id: &str,
        amount: Decimal,
        tx_type: TransactionType,
    ) -> ServiceResult<TransactionRecord> {
        let existing = {
            let mut conn = self.store.pool().acquire().await?;
            TransactionRepo::find_by_reference(&mut *conn, reference)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Transaction {}", reference)))?
        };
        claim_existing(existing, initiator_id, amount, tx_type)
    }

    /// Audit writes happen after commit and never fail the movement
    pub(crate) async fn emit_audit(&self, record: AuditRecord) {
        if let Err(e) = self.audit.record(record).await {
            tracing::warn!(error = %e, "audit sink write failed");
        }
    }
}

/// A reference only replays the request that settled it.
///
/// Anything else, same caller or not, is a collision; the stored record
/// is never disclosed to a request it does not belong to.
pub(crate) fn claim_existing(
    existing: TransactionRecord,
    initiator_id: &str,
    amount: Decimal,
    tx_type: TransactionType,
) -> ServiceResult<TransactionRecord> {
    if existing.initiator_id != initiator_id
        || existing.amount != amount
        || existing.tx_type != tx_type
    {
        return Err(ServiceError::Validation(format!(
            "Reference {} is already in use",
            existing.reference
        )));
    }
    Ok(existing)
}

pub(crate) fn positive_amount(amount: Decimal) -> ServiceResult<()> {
    Amount::positive(amount)
        .map(|_| ())
        .map_err(|e| ServiceError::Validation(e.to_string()))
}

pub(crate) fn ensure_active(wallet: &Wallet) -> ServiceResult<()> {
    if wallet.status != WalletStatus::Active {
        return Err(ServiceError::InvalidState(format!(
            "Wallet {} is {}",
            wallet.id, wallet.status
        )));
    }
    Ok(())
}

pub(crate) fn resolve_status(assessment: &RiskAssessment) -> TransactionStatus {
    match assessment.recommendation {
        RiskRecommendation::Allow => TransactionStatus::Completed,
        // HOLD and FLAG both withhold the credit side
        _ => TransactionStatus::Flagged,
    }
}
