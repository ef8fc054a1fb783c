//! Administrative balance override
//!
//! Skips the risk gate (operator action, not customer-initiated) but
//! mandates a non-empty reason and an unconditional audit record after
//! commit. The non-negative-balance invariant holds for every actor:
//! a debit below available funds fails exactly as in the customer path.

use paycore_audit::{AuditAction, AuditRecord};
use paycore_core::{
    AdjustmentDirection, MetadataKey, TransactionStatus, TransactionType, TxMetadata,
};
use paycore_ledger::{record_entry, NewEntry};
use paycore_store::{NewTransaction, TransactionRecord, TransactionRepo, WalletRepo};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::transfer::{ensure_active, positive_amount, TransactionService};

/// An operator-initiated balance correction
#[derive(Debug, Clone)]
pub struct AdjustmentRequest {
    pub admin_id: String,
    pub wallet_id: String,
    pub amount: Decimal,
    pub direction: AdjustmentDirection,
    pub reason: String,
    pub client_ip: Option<String>,
}

impl TransactionService {
    /// Apply a manual credit or debit with full ledger and audit trail
    pub async fn adjust_balance(
        &self,
        request: AdjustmentRequest,
    ) -> ServiceResult<TransactionRecord> {
        positive_amount(request.amount)?;
        if request.reason.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Adjustment requires a non-empty reason".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;

        let before = WalletRepo::get_for_update(&mut tx, &request.wallet_id).await?;
        ensure_active(&before)?;
        let after = match request.direction {
            AdjustmentDirection::Credit => {
                WalletRepo::credit(&mut tx, &request.wallet_id, request.amount).await?
            }
            AdjustmentDirection::Debit => {
                WalletRepo::debit(&mut tx, &request.wallet_id, request.amount).await?
            }
        };

        let mut metadata = TxMetadata::new()
            .with(MetadataKey::AdjustmentReason, request.reason.clone())
            .with(MetadataKey::AdminId, request.admin_id.clone());
        if let Some(ip) = &request.client_ip {
            metadata.insert(MetadataKey::ClientIp, ip.clone());
        }

        let mut new = NewTransaction::simple(
            Uuid::new_v4().to_string(),
            TransactionType::Adjustment,
            TransactionStatus::Completed,
            &request.admin_id,
            request.amount,
            before.currency.clone(),
        );
        new.description = Some(request.reason.clone());
        new.metadata = metadata;
        match request.direction {
            AdjustmentDirection::Credit => new.to_wallet_id = Some(request.wallet_id.clone()),
            AdjustmentDirection::Debit => new.from_wallet_id = Some(request.wallet_id.clone()),
        }
        let record = TransactionRepo::insert(&mut tx, new).await?;

        let entry = match request.direction {
            AdjustmentDirection::Credit => {
                NewEntry::credit(&record.id, &request.wallet_id, request.amount, after.balance)
            }
            AdjustmentDirection::Debit => {
                NewEntry::debit(&record.id, &request.wallet_id, request.amount, after.balance)
            }
        };
        record_entry(&mut tx, entry.with_description(request.reason.clone())).await?;

        tx.commit().await?;

        self.emit_audit(
            AuditRecord::new(
                AuditAction::BalanceAdjusted,
                &request.admin_id,
                request.amount,
                before.currency.clone(),
            )
            .with_reference(&record.reference)
            .with_details(serde_json::json!({
                "wallet_id": request.wallet_id,
                "direction": request.direction,
                "reason": request.reason,
                "balance_before": before.balance.to_string(),
                "balance_after": after.balance.to_string(),
                "ip": request.client_ip,
            })),
        )
        .await;

        tracing::info!(
            transaction = %record.id,
            wallet = %request.wallet_id,
            direction = %request.direction,
            amount = %request.amount,
            "balance adjusted"
        );
        Ok(record)
    }
}
