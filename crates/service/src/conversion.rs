//! Cross-currency movements
//!
//! Conversions move funds between two wallets of the same owner in
//! different currencies at a rate taken from the injected lookup. The
//! crypto buy/sell paths are conversions under their own transaction
//! types.

use paycore_core::{MetadataKey, TransactionStatus, TransactionType, TxMetadata};
use paycore_ledger::{record_entry, NewEntry};
use paycore_store::{
    FraudReportRepo, NewFraudReport, NewTransaction, StoreError, TransactionRecord,
    TransactionRepo, WalletRepo,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::transfer::{
    claim_existing, ensure_active, positive_amount, resolve_status, TransactionService,
};

/// A same-owner cross-currency movement request
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub from_wallet_id: String,
    pub to_wallet_id: String,
    pub initiator_id: String,
    /// Amount in the source wallet's currency
    pub amount: Decimal,
    pub reference: Option<String>,
}

impl ConversionRequest {
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
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

impl TransactionService {
    /// Convert between two of the initiator's own wallets
    pub async fn convert(&self, request: ConversionRequest) -> ServiceResult<TransactionRecord> {
        self.convert_as(request, TransactionType::Conversion).await
    }

    /// Buy crypto: fiat wallet debited, crypto wallet credited at rate
    pub async fn crypto_buy(&self, request: ConversionRequest) -> ServiceResult<TransactionRecord> {
        self.convert_as(request, TransactionType::CryptoBuy).await
    }

    /// Sell crypto: crypto wallet debited, fiat wallet credited at rate
    pub async fn crypto_sell(
        &self,
        request: ConversionRequest,
    ) -> ServiceResult<TransactionRecord> {
        self.convert_as(request, TransactionType::CryptoSell).await
    }

    async fn convert_as(
        &self,
        request: ConversionRequest,
        tx_type: TransactionType,
    ) -> ServiceResult<TransactionRecord> {
        positive_amount(request.amount)?;

        let (source, destination) = {
            let mut conn = self.store.pool().acquire().await?;
            let source = WalletRepo::get(&mut *conn, &request.from_wallet_id).await?;
            let destination = WalletRepo::get(&mut *conn, &request.to_wallet_id).await?;
            (source, destination)
        };

        if source.owner_id != request.initiator_id {
            return Err(ServiceError::NotFound(format!(
                "Wallet {}",
                request.from_wallet_id
            )));
        }
        // Both ends belong to the converter; this is not a payment path
        if destination.owner_id != request.initiator_id {
            return Err(ServiceError::NotFound(format!(
                "Wallet {}",
                request.to_wallet_id
            )));
        }
        ensure_active(&source)?;
        ensure_active(&destination)?;
        if source.currency == destination.currency {
            return Err(ServiceError::Validation(
                "Conversion requires two different currencies".to_string(),
            ));
        }
        if source.available_balance < request.amount {
            return Err(ServiceError::InsufficientFunds {
                available: source.available_balance,
                required: request.amount,
            });
        }

        let rate = self
            .rates
            .rate(&source.currency, &destination.currency)
            .await
            .ok_or_else(|| ServiceError::RateUnavailable {
                from: source.currency.clone(),
                to: destination.currency.clone(),
            })?;
        let converted = (request.amount * rate).round_dp(2);
        if converted.is_zero() {
            return Err(ServiceError::Validation(
                "Converted amount rounds to zero".to_string(),
            ));
        }

        let assessment = self
            .assess(&request.initiator_id, request.amount, &source.currency, tx_type)
            .await?;
        self.check_blocked(&assessment, &request.initiator_id, request.amount, &source.currency)
            .await?;
        let status = resolve_status(&assessment);

        let metadata = TxMetadata::new()
            .with(MetadataKey::ExchangeRate, rate.to_string())
            .with(MetadataKey::ConvertedAmount, converted.to_string());

        let reference = request
            .reference
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut tx = self.store.begin().await?;

        if let Some(existing) = TransactionRepo::find_by_reference(&mut tx, &reference).await? {
            return claim_existing(existing, &request.initiator_id, request.amount, tx_type);
        }

        let source = WalletRepo::get_for_update(&mut tx, &source.id).await?;
        ensure_active(&source)?;
        let destination = WalletRepo::get_for_update(&mut tx, &destination.id).await?;
        ensure_active(&destination)?;

        let debited = WalletRepo::debit(&mut tx, &source.id, request.amount).await?;

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
                fee: Decimal::ZERO,
                currency: source.currency.clone(),
                target_currency: Some(destination.currency.clone()),
                exchange_rate: Some(rate),
                converted_amount: Some(converted),
                risk_score: assessment.score as i64,
                description: None,
                metadata,
            },
        )
        .await
        {
            Ok(record) => record,
            Err(StoreError::DuplicateReference(reference)) => {
                tx.rollback().await?;
                return self
                    .settled_by_reference(&reference, &request.initiator_id, request.amount, tx_type)
                    .await;
            }
            Err(e) => return Err(e.into()),
        };

        record_entry(
            &mut tx,
            NewEntry::debit(&record.id, &source.id, request.amount, debited.balance),
        )
        .await?;

        if status == TransactionStatus::Completed {
            let credited = WalletRepo::credit(&mut tx, &destination.id, converted).await?;
            record_entry(
                &mut tx,
                NewEntry::credit(&record.id, &destination.id, converted, credited.balance),
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

        tracing::info!(
            transaction = %record.id,
            tx_type = %tx_type,
            rate = %rate,
            converted = %converted,
            "conversion settled"
        );
        Ok(record)
    }
}
