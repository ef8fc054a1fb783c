//! CLI commands

use chrono::Utc;
use paycore_core::{AdjustmentDirection, Currency};
use paycore_service::{AdjustmentRequest, ConversionRequest, TransferRequest};
use paycore_store::{
    FraudReportRepo, InitiatorRepo, NewWallet, TransactionRepo, WalletRepo,
};
use rust_decimal::Decimal;

use crate::context::AppContext;

/// Register an initiator profile
pub async fn register(ctx: &AppContext, initiator_id: &str) -> Result<(), anyhow::Error> {
    let mut tx = ctx.store.begin().await?;
    InitiatorRepo::create(&mut tx, initiator_id, Utc::now()).await?;
    tx.commit().await?;

    println!("✅ Registered initiator {}", initiator_id);
    Ok(())
}

/// Mark an initiator's identity as verified
pub async fn verify(ctx: &AppContext, initiator_id: &str) -> Result<(), anyhow::Error> {
    let mut tx = ctx.store.begin().await?;
    InitiatorRepo::set_verified(&mut tx, initiator_id, true).await?;
    tx.commit().await?;

    println!("✅ Verified initiator {}", initiator_id);
    Ok(())
}

/// Create a wallet for an owner
pub async fn create_wallet(
    ctx: &AppContext,
    owner_id: &str,
    currency: Currency,
) -> Result<(), anyhow::Error> {
    let mut tx = ctx.store.begin().await?;
    let wallet = WalletRepo::create(
        &mut tx,
        NewWallet {
            owner_id: owner_id.to_string(),
            currency: currency.clone(),
            is_default: false,
        },
    )
    .await?;
    tx.commit().await?;

    println!("✅ Created {} wallet {} for {}", currency, wallet.id, owner_id);
    Ok(())
}

/// Deposit external funds into a wallet
pub async fn deposit(
    ctx: &AppContext,
    wallet_id: &str,
    initiator_id: &str,
    amount: Decimal,
    reference: Option<String>,
) -> Result<(), anyhow::Error> {
    let record = ctx
        .service
        .deposit(wallet_id, initiator_id, amount, reference)
        .await?;

    println!(
        "✅ Deposited {} {} into {} (tx: {})",
        amount, record.currency, wallet_id, record.id
    );
    Ok(())
}

/// Transfer between two same-currency wallets
pub async fn transfer(
    ctx: &AppContext,
    from: &str,
    to: &str,
    initiator_id: &str,
    amount: Decimal,
    reference: Option<String>,
) -> Result<(), anyhow::Error> {
    let mut request = TransferRequest::new(from, to, initiator_id, amount);
    if let Some(reference) = reference {
        request = request.with_reference(reference);
    }
    let record = ctx.service.create_transfer(request).await?;

    println!(
        "✅ Transfer {} {} from {} to {} settled {} (tx: {}, risk {})",
        amount, record.currency, from, to, record.status, record.id, record.risk_score
    );
    Ok(())
}

/// Withdraw funds toward an external destination
pub async fn withdraw(
    ctx: &AppContext,
    wallet_id: &str,
    initiator_id: &str,
    amount: Decimal,
    reference: Option<String>,
) -> Result<(), anyhow::Error> {
    let record = ctx
        .service
        .withdraw(wallet_id, initiator_id, amount, reference)
        .await?;

    println!(
        "✅ Withdrew {} {} from {} ({}, tx: {})",
        amount, record.currency, wallet_id, record.status, record.id
    );
    Ok(())
}

/// Convert between two same-owner wallets in different currencies
pub async fn convert(
    ctx: &AppContext,
    from: &str,
    to: &str,
    initiator_id: &str,
    amount: Decimal,
) -> Result<(), anyhow::Error> {
    let record = ctx
        .service
        .convert(ConversionRequest::new(from, to, initiator_id, amount))
        .await?;

    println!(
        "✅ Converted {} {} -> {} {} at rate {} (tx: {})",
        record.amount,
        record.currency,
        record.converted_amount.unwrap_or_default(),
        record
            .target_currency
            .as_ref()
            .map(|c| c.code())
            .unwrap_or("?"),
        record.exchange_rate.unwrap_or_default(),
        record.id
    );
    Ok(())
}

/// Administrative balance adjustment
#[allow(clippy::too_many_arguments)]
pub async fn adjust(
    ctx: &AppContext,
    admin_id: &str,
    wallet_id: &str,
    amount: Decimal,
    direction: AdjustmentDirection,
    reason: &str,
    ip: Option<String>,
) -> Result<(), anyhow::Error> {
    let record = ctx
        .service
        .adjust_balance(AdjustmentRequest {
            admin_id: admin_id.to_string(),
            wallet_id: wallet_id.to_string(),
            amount,
            direction,
            reason: reason.to_string(),
            client_ip: ip,
        })
        .await?;

    println!(
        "✅ Adjusted {} by {} {} ({}, tx: {})",
        wallet_id, direction, amount, reason, record.id
    );
    Ok(())
}

/// Show a wallet's balances
pub async fn balance(ctx: &AppContext, wallet_id: &str) -> Result<(), anyhow::Error> {
    let mut conn = ctx.store.pool().acquire().await?;
    let wallet = WalletRepo::get(&mut *conn, wallet_id).await?;

    println!(
        "{} [{}] {}: balance {}, available {}",
        wallet.id, wallet.status, wallet.currency, wallet.balance, wallet.available_balance
    );
    Ok(())
}

/// Show a wallet's recent transactions
pub async fn history(ctx: &AppContext, wallet_id: &str, limit: i64) -> Result<(), anyhow::Error> {
    let mut conn = ctx.store.pool().acquire().await?;
    let records = TransactionRepo::list_for_wallet(&mut *conn, wallet_id, limit).await?;

    if records.is_empty() {
        println!("No transactions for {}", wallet_id);
        return Ok(());
    }
    for record in records {
        println!(
            "{}  {:<12} {:<10} {} {}  (risk {})",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.tx_type.to_string(),
            record.status.to_string(),
            record.amount,
            record.currency,
            record.risk_score
        );
    }
    Ok(())
}

/// List an owner's wallets
pub async fn wallets(ctx: &AppContext, owner_id: &str) -> Result<(), anyhow::Error> {
    let mut conn = ctx.store.pool().acquire().await?;
    let wallets = WalletRepo::list_for_owner(&mut *conn, owner_id).await?;

    if wallets.is_empty() {
        println!("No wallets for {}", owner_id);
        return Ok(());
    }
    for wallet in wallets {
        println!(
            "{} [{}] {}: balance {}, available {}",
            wallet.id, wallet.status, wallet.currency, wallet.balance, wallet.available_balance
        );
    }
    Ok(())
}

/// Show a wallet's ledger entries with running balances
pub async fn statement(ctx: &AppContext, wallet_id: &str) -> Result<(), anyhow::Error> {
    let mut conn = ctx.store.pool().acquire().await?;
    let entries = paycore_ledger::entries_for_wallet(&mut *conn, wallet_id).await?;

    if entries.is_empty() {
        println!("No ledger entries for {}", wallet_id);
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:>14}  balance {:>14}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.amount,
            entry.balance_after,
            entry.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Run a full reconciliation sweep and print the report
pub async fn reconcile(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let report = ctx.recon.run_full().await?;

    println!(
        "Checked {} wallets: {} consistent, {} drifted, {} errors",
        report.checked,
        report.consistent_count,
        report.mismatches.len(),
        report.errors.len()
    );
    for mismatch in &report.mismatches {
        println!(
            "  ⚠ {} (owner {}, {}): recorded {}, ledger {}, discrepancy {}",
            mismatch.wallet_id,
            mismatch.owner_id,
            mismatch.currency,
            mismatch.recorded_balance,
            mismatch.computed_balance,
            mismatch.discrepancy
        );
    }
    for error in &report.errors {
        println!("  ✗ {}", error);
    }
    Ok(())
}

/// List fraud reports awaiting review
pub async fn reports(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let mut conn = ctx.store.pool().acquire().await?;
    let open = FraudReportRepo::list_open(&mut *conn).await?;

    if open.is_empty() {
        println!("No open fraud reports");
        return Ok(());
    }
    for report in open {
        println!(
            "{}  tx {}  score {} ({})  flags: {}",
            report.created_at.format("%Y-%m-%d %H:%M:%S"),
            report.transaction_id,
            report.score,
            report.level,
            report.flags.join(", ")
        );
    }
    Ok(())
}
