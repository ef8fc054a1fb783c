//! Paycore CLI - Main entry point

use clap::{Parser, Subcommand};
use paycore_cli::{commands, AppContext};
use paycore_core::{AdjustmentDirection, Currency};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paycore")]
#[command(about = "Paycore - ledger and transaction processing core", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an initiator profile
    Register {
        /// Initiator ID
        initiator: String,
    },

    /// Mark an initiator's identity as verified
    Verify {
        /// Initiator ID
        initiator: String,
    },

    /// Create a wallet
    CreateWallet {
        /// Owner ID
        owner: String,
        /// Currency code
        currency: Currency,
    },

    /// Deposit external funds into a wallet
    Deposit {
        /// Wallet ID
        wallet: String,
        /// Initiating party
        #[arg(long)]
        initiator: String,
        /// Amount to deposit
        amount: Decimal,
        /// Optional idempotency reference
        #[arg(long)]
        reference: Option<String>,
    },

    /// Transfer between two same-currency wallets
    Transfer {
        /// Source wallet ID
        from: String,
        /// Destination wallet ID
        to: String,
        /// Initiating party (must own the source wallet)
        #[arg(long)]
        initiator: String,
        /// Amount to transfer
        amount: Decimal,
        /// Optional idempotency reference
        #[arg(long)]
        reference: Option<String>,
    },

    /// Withdraw funds toward an external destination
    Withdraw {
        /// Wallet ID
        wallet: String,
        /// Initiating party (must own the wallet)
        #[arg(long)]
        initiator: String,
        /// Amount to withdraw
        amount: Decimal,
        /// Optional idempotency reference
        #[arg(long)]
        reference: Option<String>,
    },

    /// Convert between two same-owner wallets in different currencies
    Convert {
        /// Source wallet ID
        from: String,
        /// Destination wallet ID
        to: String,
        /// Initiating party (must own both wallets)
        #[arg(long)]
        initiator: String,
        /// Amount in the source currency
        amount: Decimal,
    },

    /// Administrative balance adjustment
    Adjust {
        /// Wallet ID
        wallet: String,
        /// Amount to adjust by
        amount: Decimal,
        /// CREDIT or DEBIT
        #[arg(long, default_value = "CREDIT")]
        direction: AdjustmentDirection,
        /// Operator ID
        #[arg(long)]
        admin: String,
        /// Required reason for the audit trail
        #[arg(long)]
        reason: String,
        /// Operator client IP
        #[arg(long)]
        ip: Option<String>,
    },

    /// List an owner's wallets
    Wallets {
        /// Owner ID
        owner: String,
    },

    /// Show a wallet's balances
    Balance {
        /// Wallet ID
        wallet: String,
    },

    /// Show a wallet's ledger entries with running balances
    Statement {
        /// Wallet ID
        wallet: String,
    },

    /// Show a wallet's recent transactions
    History {
        /// Wallet ID
        wallet: String,
        /// Maximum number of transactions to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },

    /// Run a full balance/ledger reconciliation sweep
    Reconcile,

    /// List fraud reports awaiting review
    Reports,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli.data).await?;

    match cli.command {
        Commands::Register { initiator } => {
            commands::register(&ctx, &initiator).await?;
        }

        Commands::Verify { initiator } => {
            commands::verify(&ctx, &initiator).await?;
        }

        Commands::CreateWallet { owner, currency } => {
            commands::create_wallet(&ctx, &owner, currency).await?;
        }

        Commands::Deposit {
            wallet,
            initiator,
            amount,
            reference,
        } => {
            commands::deposit(&ctx, &wallet, &initiator, amount, reference).await?;
        }

        Commands::Transfer {
            from,
            to,
            initiator,
            amount,
            reference,
        } => {
            commands::transfer(&ctx, &from, &to, &initiator, amount, reference).await?;
        }

        Commands::Withdraw {
            wallet,
            initiator,
            amount,
            reference,
        } => {
            commands::withdraw(&ctx, &wallet, &initiator, amount, reference).await?;
        }

        Commands::Convert {
            from,
            to,
            initiator,
            amount,
        } => {
            commands::convert(&ctx, &from, &to, &initiator, amount).await?;
        }

        Commands::Adjust {
            wallet,
            amount,
            direction,
            admin,
            reason,
            ip,
        } => {
            commands::adjust(&ctx, &admin, &wallet, amount, direction, &reason, ip).await?;
        }

        Commands::Wallets { owner } => {
            commands::wallets(&ctx, &owner).await?;
        }

        Commands::Balance { wallet } => {
            commands::balance(&ctx, &wallet).await?;
        }

        Commands::Statement { wallet } => {
            commands::statement(&ctx, &wallet).await?;
        }

        Commands::History { wallet, limit } => {
            commands::history(&ctx, &wallet, limit).await?;
        }

        Commands::Reconcile => {
            commands::reconcile(&ctx).await?;
        }

        Commands::Reports => {
            commands::reports(&ctx).await?;
        }
    }

    Ok(())
}
