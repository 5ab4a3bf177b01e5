use crate::datasource::{AccountRecord, LedgerAccountSource};
use crate::domain::{
    AccountBalance, AccountHoldings, AccountId, AssetInfo, AssetValuation, Decimal,
    DividendDistribution, FundSnapshot, HolderBalance, Holding, PricingSource, ValuationKind,
};
use crate::pricing::{PriceDiscoveryService, PricingError};
use crate::valuation::{lookup_valuation, ValuationError, ValuationResolver, ValuationScanner};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Static description of a fund, loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundStructure {
    pub fund_token: AssetInfo,
    #[serde(default)]
    pub companion_token: Option<AssetInfo>,
    pub issuer: AccountId,
    pub share_supply: Decimal,
    pub accounts: Vec<FundAccount>,
    #[serde(default)]
    pub dividends: Vec<DividendDistribution>,
    #[serde(default)]
    pub holders: Vec<HolderBalance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundAccount {
    pub id: AccountId,
    #[serde(default)]
    pub label: String,
}

impl FundStructure {
    pub fn from_json(json: &str) -> Result<Self, AssemblyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssemblyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| AssemblyError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Failed to read fund structure {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid fund structure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Snapshot assembly cancelled")]
    Cancelled,
}

/// Prices every fund holding and builds the snapshot handed to the indicator engine.
#[derive(Debug, Clone)]
pub struct SnapshotAssembler {
    prices: Arc<PriceDiscoveryService>,
    accounts: Arc<dyn LedgerAccountSource>,
    scanner: ValuationScanner,
    resolver: ValuationResolver,
}

impl SnapshotAssembler {
    pub fn new(
        prices: Arc<PriceDiscoveryService>,
        accounts: Arc<dyn LedgerAccountSource>,
        scanner: ValuationScanner,
        resolver: ValuationResolver,
    ) -> Self {
        Self {
            prices,
            accounts,
            scanner,
            resolver,
        }
    }

    pub async fn assemble(
        &self,
        structure: &FundStructure,
        cancel: &CancellationToken,
    ) -> Result<FundSnapshot, AssemblyError> {
        if cancel.is_cancelled() {
            return Err(AssemblyError::Cancelled);
        }
        let valuations = match self.scanner.fetch_all_valuations(cancel).await {
            Ok(valuations) => valuations,
            Err(ValuationError::Cancelled) => return Err(AssemblyError::Cancelled),
            Err(e) => {
                warn!("Valuation scan failed, using market prices only: {}", e);
                Vec::new()
            }
        };

        let mut accounts = Vec::with_capacity(structure.accounts.len());
        for fund_account in &structure.accounts {
            let record = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AssemblyError::Cancelled),
                record = self.accounts.fetch_account(&fund_account.id) => record,
            };
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(account = %fund_account.id, "Skipping fund account: {}", e);
                    continue;
                }
            };
            let holdings = self.price_account(&record, &valuations, cancel).await?;
            accounts.push(AccountHoldings {
                account: fund_account.id.clone(),
                label: fund_account.label.clone(),
                holdings,
            });
        }

        let share_price = match self
            .prices
            .get_price(
                &structure.fund_token,
                &self.prices.references().primary,
                Decimal::one(),
                cancel,
            )
            .await
        {
            Ok(price) => price.price,
            Err(PricingError::Cancelled) => return Err(AssemblyError::Cancelled),
            Err(e) => {
                warn!(asset = %structure.fund_token, "Share price unavailable: {}", e);
                Decimal::zero()
            }
        };

        info!(
            accounts = accounts.len(),
            share_price = %share_price,
            "Fund snapshot assembled"
        );

        let references = self.prices.references();
        Ok(FundSnapshot {
            taken_at: Utc::now(),
            fund_token: structure.fund_token.clone(),
            companion_token: structure.companion_token.clone(),
            issuer: structure.issuer.clone(),
            primary_reference: references.primary.clone(),
            secondary_reference: references.secondary.clone(),
            share_supply: structure.share_supply,
            share_price,
            accounts,
            dividends: structure.dividends.clone(),
            holders: structure.holders.clone(),
        })
    }

    async fn price_account(
        &self,
        record: &AccountRecord,
        valuations: &[AssetValuation],
        cancel: &CancellationToken,
    ) -> Result<Vec<Holding>, AssemblyError> {
        let mut holdings = Vec::new();
        for balance in record.balances.iter().filter(|b| b.balance.is_positive()) {
            let holding = match self
                .manual_holding(&record.id, balance, valuations, cancel)
                .await?
            {
                Some(holding) => holding,
                None => self.market_holding(balance, cancel).await?,
            };
            holdings.push(holding);
        }
        Ok(holdings)
    }

    /// Holding priced by a manual valuation override, if one resolves.
    async fn manual_holding(
        &self,
        owner: &AccountId,
        balance: &AccountBalance,
        valuations: &[AssetValuation],
        cancel: &CancellationToken,
    ) -> Result<Option<Holding>, AssemblyError> {
        let Some(valuation) =
            lookup_valuation(balance.asset.code(), balance.balance, owner, valuations)
        else {
            return Ok(None);
        };

        let resolved = match self.resolver.resolve_valuation(valuation, cancel).await {
            Ok(resolved) => resolved,
            Err(ValuationError::Cancelled) => return Err(AssemblyError::Cancelled),
            Err(e) => {
                warn!(asset = %balance.asset, "Manual valuation unusable, falling back to market: {}", e);
                return Ok(None);
            }
        };

        let (price_primary, value_primary) = match valuation.kind {
            ValuationKind::Nft => {
                let total = resolved.value_in_reference_currency;
                (total.safe_div(balance.balance), total)
            }
            ValuationKind::Unit => {
                let price = resolved.value_in_reference_currency;
                (price, (price * balance.balance).round_ledger())
            }
        };

        let references = self.prices.references();
        let cross_rate = match self
            .prices
            .get_price(&references.primary, &references.secondary, Decimal::one(), cancel)
            .await
        {
            Ok(price) => price.price,
            Err(PricingError::Cancelled) => return Err(AssemblyError::Cancelled),
            Err(e) => {
                warn!("Reference cross rate unavailable: {}", e);
                Decimal::zero()
            }
        };

        debug!(
            asset = %balance.asset,
            account = %owner,
            kind = %valuation.kind,
            value = %value_primary,
            "Holding priced by manual valuation"
        );
        Ok(Some(Holding {
            asset: balance.asset.clone(),
            balance: balance.balance,
            price_primary,
            price_secondary: price_primary * cross_rate,
            value_primary,
            value_secondary: (value_primary * cross_rate).round_ledger(),
            pricing: PricingSource::ManualValuation,
        }))
    }

    async fn market_holding(
        &self,
        balance: &AccountBalance,
        cancel: &CancellationToken,
    ) -> Result<Holding, AssemblyError> {
        match self
            .prices
            .get_token_prices(&balance.asset, balance.balance, cancel)
            .await
        {
            Ok(prices) => Ok(Holding {
                asset: balance.asset.clone(),
                balance: balance.balance,
                price_primary: prices.price_primary,
                price_secondary: prices.price_secondary,
                value_primary: prices.value_primary,
                value_secondary: prices.value_secondary,
                pricing: PricingSource::Market,
            }),
            Err(PricingError::Cancelled) => Err(AssemblyError::Cancelled),
            Err(e) => {
                warn!(asset = %balance.asset, "Holding left unpriced: {}", e);
                Ok(Holding {
                    asset: balance.asset.clone(),
                    balance: balance.balance,
                    price_primary: Decimal::zero(),
                    price_secondary: Decimal::zero(),
                    value_primary: Decimal::zero(),
                    value_secondary: Decimal::zero(),
                    pricing: PricingSource::Unpriced,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fund_structure_from_json_defaults() {
        let json = r#"{
            "fund_token": "FUND:GISSUER",
            "issuer": "GISSUER",
            "share_supply": "10000",
            "accounts": [{"id": "GTREASURY", "label": "treasury"}, {"id": "GVAULT"}]
        }"#;
        let structure = FundStructure::from_json(json).unwrap();
        assert_eq!(structure.fund_token.code(), "FUND");
        assert_eq!(structure.accounts.len(), 2);
        assert_eq!(structure.accounts[1].label, "");
        assert!(structure.companion_token.is_none());
        assert!(structure.dividends.is_empty());
    }

    #[test]
    fn test_fund_structure_rejects_bad_asset() {
        let json = r#"{
            "fund_token": "FUND",
            "issuer": "GISSUER",
            "share_supply": "1",
            "accounts": []
        }"#;
        assert!(matches!(
            FundStructure::from_json(json),
            Err(AssemblyError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            FundStructure::load("/nonexistent/fund.json"),
            Err(AssemblyError::Read { .. })
        ));
    }
}
