//! Returns and portfolio composition metrics.

use super::dividends::one_year_before;
use super::{ids, id_set, CalculationContext, Calculator, CalculatorError, ComputedIndicators};
use crate::domain::{Decimal, Indicator, IndicatorId};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsCalculator;

impl AnalyticsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Value of `id` one year before the snapshot, zero without history.
    async fn year_ago(&self, ctx: &CalculationContext<'_>, id: IndicatorId) -> Decimal {
        let Some(history) = ctx.history else {
            return Decimal::zero();
        };
        match history
            .indicator_value_at(id, one_year_before(ctx.snapshot.taken_at))
            .await
        {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(indicator = %id, "History lookup failed: {}", e);
                Decimal::zero()
            }
        }
    }
}

/// Percentage change from `from` to `to`, zero when `from` is zero.
fn change_percent(from: Decimal, to: Decimal) -> Decimal {
    (to - from).percent_of(from)
}

#[async_trait]
impl Calculator for AnalyticsCalculator {
    fn name(&self) -> &'static str {
        "analytics"
    }

    fn ids(&self) -> BTreeSet<IndicatorId> {
        id_set(&[
            ids::SHARE_PRICE_1Y_AGO,
            ids::ROI_12M,
            ids::TOTAL_RETURN_12M,
            ids::LARGEST_HOLDING_WEIGHT,
            ids::MANUAL_VALUATION_SHARE,
            ids::CASH_RATIO,
            ids::NAV_CHANGE_12M,
        ])
    }

    fn dependencies(&self) -> BTreeSet<IndicatorId> {
        id_set(&[
            ids::TOTAL_ASSETS_PRIMARY,
            ids::SHARE_PRICE,
            ids::MANUALLY_VALUED_VALUE,
            ids::REFERENCE_CASH_VALUE,
            ids::DIVIDEND_PER_SHARE_12M,
        ])
    }

    async fn calculate(
        &self,
        ctx: &CalculationContext<'_>,
        computed: &ComputedIndicators,
    ) -> Result<Vec<Indicator>, CalculatorError> {
        let assets = computed.value(ids::TOTAL_ASSETS_PRIMARY);
        let price = computed.value(ids::SHARE_PRICE);
        let dividend_per_share = computed.value(ids::DIVIDEND_PER_SHARE_12M);

        let (price_year_ago, assets_year_ago) = tokio::join!(
            self.year_ago(ctx, ids::SHARE_PRICE),
            self.year_ago(ctx, ids::TOTAL_ASSETS_PRIMARY),
        );

        let roi = change_percent(price_year_ago, price);
        let total_return = (price - price_year_ago + dividend_per_share).percent_of(price_year_ago);
        let nav_change = change_percent(assets_year_ago, assets);

        let mut by_asset: HashMap<String, Decimal> = HashMap::new();
        for holding in ctx.snapshot.asset_holdings() {
            *by_asset.entry(holding.asset.canonical()).or_default() += holding.value_primary;
        }
        let largest = by_asset.values().copied().max().unwrap_or_default();

        Ok(vec![
            Indicator::new(ids::SHARE_PRICE_1Y_AGO, "Share price one year ago", price_year_ago, ""),
            Indicator::new(ids::ROI_12M, "Return on investment (12 months)", roi, "%"),
            Indicator::new(ids::TOTAL_RETURN_12M, "Total return (12 months)", total_return, "%"),
            Indicator::new(
                ids::LARGEST_HOLDING_WEIGHT,
                "Largest holding weight",
                largest.percent_of(assets),
                "%",
            ),
            Indicator::new(
                ids::MANUAL_VALUATION_SHARE,
                "Manually valued share of assets",
                computed.value(ids::MANUALLY_VALUED_VALUE).percent_of(assets),
                "%",
            ),
            Indicator::new(
                ids::CASH_RATIO,
                "Cash ratio",
                computed.value(ids::REFERENCE_CASH_VALUE).percent_of(assets),
                "%",
            ),
            Indicator::new(ids::NAV_CHANGE_12M, "Net asset value change (12 months)", nav_change, "%"),
        ])
    }
}
