//! Application context - wires everything together

use paycore_audit::JsonlAuditSink;
use paycore_core::Currency;
use paycore_recon::ReconciliationService;
use paycore_risk::{RiskConfig, RiskScorer};
use paycore_service::{FixedRateLookup, ServiceConfig, TransactionService};
use paycore_store::{Store, StoreHistory};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Wires together all components behind the CLI commands
pub struct AppContext {
    pub store: Store,
    pub service: TransactionService,
    pub recon: ReconciliationService,
}

impl AppContext {
    /// Open (or create) the data directory and assemble the stack.
    ///
    /// Optional files under the data directory:
    /// `risk.json` (risk thresholds), `service.json` (timeouts, fee,
    /// held-funds policy), `rates.json` (pinned exchange rates as
    /// `{ "USD:EUR": "0.9" }`).
    pub async fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        std::fs::create_dir_all(data_path)?;

        let store = Store::connect(&data_path.join("paycore.db")).await?;
        store.init_schema().await?;

        let risk_config = load_or_default(&data_path.join("risk.json"), RiskConfig::from_file)?;
        let service_config =
            load_or_default(&data_path.join("service.json"), ServiceConfig::from_file)?;

        let history = StoreHistory::new(store.clone());
        let scorer = RiskScorer::new(risk_config, Arc::new(history));

        let rates = load_rates(&data_path.join("rates.json"))?;
        let audit = Arc::new(JsonlAuditSink::new(data_path.join("audit"))?);

        let service = TransactionService::new(
            store.clone(),
            scorer,
            Arc::new(rates),
            audit,
            service_config,
        );
        let recon = ReconciliationService::new(store.clone());

        Ok(Self {
            store,
            service,
            recon,
        })
    }
}

fn load_or_default<T: Default>(
    path: &Path,
    from_file: impl Fn(&Path) -> Result<T, std::io::Error>,
) -> Result<T, anyhow::Error> {
    if path.exists() {
        Ok(from_file(path)?)
    } else {
        Ok(T::default())
    }
}

fn load_rates(path: &Path) -> Result<FixedRateLookup, anyhow::Error> {
    let mut lookup = FixedRateLookup::new();
    if !path.exists() {
        return Ok(lookup);
    }

    let content = std::fs::read_to_string(path)?;
    let table: HashMap<String, String> = serde_json::from_str(&content)?;
    for (pair, rate) in table {
        let (from, to) = pair
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Bad rate pair: {}", pair))?;
        lookup = lookup.with_rate(
            Currency::from_str(from)?,
            Currency::from_str(to)?,
            Decimal::from_str(&rate)?,
        );
    }
    Ok(lookup)
}
