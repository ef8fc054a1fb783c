//! Read paths with access control
//!
//! A caller may see a transaction only as its initiator or as the owner
//! of one of the wallets involved. Denials read as NotFound; existence of
//! other users' transactions is not disclosed.

use paycore_store::{TransactionRecord, TransactionRepo, WalletRepo};

use crate::error::{ServiceError, ServiceResult};
use crate::transfer::TransactionService;

impl TransactionService {
    /// Fetch one transaction visible to the caller
    pub async fn get_transaction(
        &self,
        caller_id: &str,
        transaction_id: &str,
    ) -> ServiceResult<TransactionRecord> {
        let mut conn = self.store.pool().acquire().await?;
        let record = TransactionRepo::get(&mut *conn, transaction_id).await?;

        if record.initiator_id == caller_id {
            return Ok(record);
        }
        let wallet_ids: Vec<String> = [record.from_wallet_id.clone(), record.to_wallet_id.clone()]
            .into_iter()
            .flatten()
            .collect();
        for wallet_id in &wallet_ids {
            let wallet = WalletRepo::get(&mut *conn, wallet_id).await?;
            if wallet.owner_id == caller_id {
                return Ok(record);
            }
        }

        Err(ServiceError::NotFound(format!(
            "Transaction {}",
            transaction_id
        )))
    }

    /// List a wallet's transactions for its owner
    pub async fn list_for_wallet(
        &self,
        caller_id: &str,
        wallet_id: &str,
        limit: i64,
    ) -> ServiceResult<Vec<TransactionRecord>> {
        let mut conn = self.store.pool().acquire().await?;
        let wallet = WalletRepo::get(&mut *conn, wallet_id).await?;

        if wallet.owner_id != caller_id {
            return Err(ServiceError::NotFound(format!("Wallet {}", wallet_id)));
        }

        Ok(TransactionRepo::list_for_wallet(&mut *conn, wallet_id, limit).await?)
    }
}
