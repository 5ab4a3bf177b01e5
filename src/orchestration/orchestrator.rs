use crate::config::{Config, ConfigError};
use crate::datasource::{
    ExternalQuoteStore, HistoricalIndicatorAccessor, HorizonClient, LedgerAccountSource,
    LedgerQuoteSource, StaticQuoteStore,
};
use crate::domain::{AssetInfo, Decimal, Indicator};
use crate::engine::{IndicatorCatalog, IndicatorRegistry, RegistryError};
use crate::error::AppError;
use crate::orchestration::snapshot::{AssemblyError, FundStructure, SnapshotAssembler};
use crate::pricing::{PriceCache, PriceDiscoveryService};
use crate::valuation::{ValuationResolver, ValuationScanner};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Indicators computed for one fund snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub fund_token: AssetInfo,
    pub taken_at: DateTime<Utc>,
    pub share_price: Decimal,
    pub indicators: Vec<Indicator>,
}

pub struct Orchestrator {
    assembler: SnapshotAssembler,
    registry: Arc<IndicatorRegistry>,
    history: Option<Arc<dyn HistoricalIndicatorAccessor>>,
}

impl Orchestrator {
    pub fn new(assembler: SnapshotAssembler, registry: Arc<IndicatorRegistry>) -> Self {
        Self {
            assembler,
            registry,
            history: None,
        }
    }

    /// Wire the Horizon-backed pipeline with the standard indicator registry.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let horizon = Arc::new(HorizonClient::new(config.ledger_api_url.clone()));
        let quotes: Arc<dyn LedgerQuoteSource> = horizon.clone();
        let accounts: Arc<dyn LedgerAccountSource> = horizon;

        let external: Arc<dyn ExternalQuoteStore> = Arc::new(
            config
                .external_quotes
                .iter()
                .fold(StaticQuoteStore::new(), |store, (symbol, price)| {
                    store.with_quote(*symbol, *price)
                }),
        );

        let prices = Arc::new(PriceDiscoveryService::new(
            quotes.clone(),
            Arc::new(PriceCache::new()),
            config.reference_assets.clone(),
            config.orderbook_depth,
        ));
        let assembler = SnapshotAssembler::new(
            prices.clone(),
            accounts.clone(),
            ValuationScanner::new(accounts.clone(), config.valuation_accounts.clone()),
            ValuationResolver::new(external),
        );

        let catalog = Arc::new(IndicatorCatalog::standard(
            config.reference_assets.primary.code(),
            config.reference_assets.secondary.code(),
        ));
        let registry = IndicatorRegistry::standard(catalog, prices, accounts, quotes)?;
        info!(
            calculators = registry.len(),
            "Indicator registry ready: {:?}",
            registry.execution_order()?
        );

        Ok(Self::new(assembler, Arc::new(registry)))
    }

    pub fn with_history(mut self, history: Arc<dyn HistoricalIndicatorAccessor>) -> Self {
        self.history = Some(history);
        self
    }

    /// Assemble a snapshot of the fund and run every registered calculator over it.
    pub async fn generate_indicators(
        &self,
        structure: &FundStructure,
        cancel: &CancellationToken,
    ) -> Result<IndicatorReport, OrchestrationError> {
        let snapshot = self.assembler.assemble(structure, cancel).await?;
        let indicators = self
            .registry
            .calculate_all(&snapshot, self.history.as_deref(), cancel)
            .await?;

        info!(
            fund = %snapshot.fund_token,
            indicators = indicators.len(),
            "Indicators generated"
        );
        Ok(IndicatorReport {
            fund_token: snapshot.fund_token,
            taken_at: snapshot.taken_at,
            share_price: snapshot.share_price,
            indicators,
        })
    }
}

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Load the fund structure named by `config` and generate its indicators once.
pub async fn run_from_config(
    config: &Config,
    cancel: &CancellationToken,
) -> Result<IndicatorReport, AppError> {
    let path = config
        .fund_structure_path
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnv("FUND_STRUCTURE_PATH".to_string()))?;
    let structure = FundStructure::load(path)?;
    let orchestrator = Orchestrator::from_config(config)?;
    Ok(orchestrator.generate_indicators(&structure, cancel).await?)
}
