//! Aggregates of the priced snapshot; no external calls.

use super::{ids, id_set, CalculationContext, Calculator, CalculatorError, ComputedIndicators};
use crate::domain::{Decimal, FundSnapshot, Holding, Indicator, IndicatorId, PricingSource};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, Default)]
pub struct BalancesCalculator;

impl BalancesCalculator {
    pub fn new() -> Self {
        Self
    }
}

fn sum_primary<'a>(holdings: impl Iterator<Item = &'a Holding>) -> Decimal {
    holdings.map(|h| h.value_primary).sum()
}

fn is_reference_cash(snapshot: &FundSnapshot, holding: &Holding) -> bool {
    holding.asset == snapshot.primary_reference || holding.asset == snapshot.secondary_reference
}

#[async_trait]
impl Calculator for BalancesCalculator {
    fn name(&self) -> &'static str {
        "balances"
    }

    fn ids(&self) -> BTreeSet<IndicatorId> {
        id_set(&[
            ids::TOTAL_ASSETS_PRIMARY,
            ids::TOTAL_ASSETS_SECONDARY,
            ids::TOTAL_SHARES,
            ids::SHARE_PRICE,
            ids::ACCOUNT_COUNT,
            ids::DISTINCT_ASSET_COUNT,
            ids::MARKET_PRICED_VALUE,
            ids::MANUALLY_VALUED_VALUE,
            ids::REFERENCE_CASH_VALUE,
        ])
    }

    fn dependencies(&self) -> BTreeSet<IndicatorId> {
        BTreeSet::new()
    }

    async fn calculate(
        &self,
        ctx: &CalculationContext<'_>,
        _computed: &ComputedIndicators,
    ) -> Result<Vec<Indicator>, CalculatorError> {
        let snapshot = ctx.snapshot;

        let total_primary = sum_primary(snapshot.asset_holdings());
        let total_secondary: Decimal = snapshot.asset_holdings().map(|h| h.value_secondary).sum();
        let market = sum_primary(
            snapshot
                .asset_holdings()
                .filter(|h| h.pricing == PricingSource::Market),
        );
        let manual = sum_primary(
            snapshot
                .asset_holdings()
                .filter(|h| h.pricing == PricingSource::ManualValuation),
        );
        let cash = sum_primary(
            snapshot
                .asset_holdings()
                .filter(|h| is_reference_cash(snapshot, h)),
        );
        let distinct_assets = snapshot
            .asset_holdings()
            .filter(|h| h.balance.is_positive())
            .map(|h| h.asset.canonical())
            .collect::<HashSet<_>>()
            .len();

        Ok(vec![
            Indicator::new(ids::TOTAL_ASSETS_PRIMARY, "Total assets value", total_primary, ""),
            Indicator::new(ids::TOTAL_ASSETS_SECONDARY, "Total assets value", total_secondary, ""),
            Indicator::new(ids::TOTAL_SHARES, "Total shares", snapshot.share_supply, "shares"),
            Indicator::new(ids::SHARE_PRICE, "Share price", snapshot.share_price, ""),
            Indicator::new(
                ids::ACCOUNT_COUNT,
                "Fund accounts",
                Decimal::from(snapshot.accounts.len()),
                "count",
            ),
            Indicator::new(
                ids::DISTINCT_ASSET_COUNT,
                "Distinct assets held",
                Decimal::from(distinct_assets),
                "count",
            ),
            Indicator::new(ids::MARKET_PRICED_VALUE, "Market-priced assets value", market, ""),
            Indicator::new(ids::MANUALLY_VALUED_VALUE, "Manually valued assets value", manual, ""),
            Indicator::new(ids::REFERENCE_CASH_VALUE, "Reference cash value", cash, ""),
        ])
    }
}
