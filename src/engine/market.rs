//! Live market lookups: circulation, bid price and reference cross rate.

use super::{ids, id_set, CalculationContext, Calculator, CalculatorError, ComputedIndicators};
use crate::datasource::{LedgerAccountSource, LedgerQuoteSource};
use crate::domain::{AssetInfo, Decimal, Indicator, IndicatorId};
use crate::pricing::{PriceDiscoveryService, PricingError};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::warn;

/// Circulating supply = total shares - issuer holding - pooled liquidity, clamped at zero.
#[derive(Debug, Clone)]
pub struct MarketCalculator {
    prices: Arc<PriceDiscoveryService>,
    accounts: Arc<dyn LedgerAccountSource>,
    quotes: Arc<dyn LedgerQuoteSource>,
}

impl MarketCalculator {
    pub fn new(
        prices: Arc<PriceDiscoveryService>,
        accounts: Arc<dyn LedgerAccountSource>,
        quotes: Arc<dyn LedgerQuoteSource>,
    ) -> Self {
        Self {
            prices,
            accounts,
            quotes,
        }
    }

    async fn issuer_held(&self, ctx: &CalculationContext<'_>) -> Result<Decimal, CalculatorError> {
        let snapshot = ctx.snapshot;
        let record = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(CalculatorError::Cancelled),
            record = self.accounts.fetch_account(&snapshot.issuer) => record,
        };
        match record {
            Ok(record) => Ok(record.balance_of(&snapshot.fund_token)),
            Err(e) => {
                warn!(account = %snapshot.issuer, "Issuer holding unavailable: {}", e);
                Ok(Decimal::zero())
            }
        }
    }

    /// Fund token reserves across pools pairing it with either reference currency.
    async fn pooled(&self, ctx: &CalculationContext<'_>) -> Result<Decimal, CalculatorError> {
        let snapshot = ctx.snapshot;
        let counters = [&snapshot.primary_reference, &snapshot.secondary_reference];
        let lookups = counters
            .iter()
            .map(|counter| self.quotes.fetch_liquidity_pools(&snapshot.fund_token, counter));
        let results = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(CalculatorError::Cancelled),
            results = join_all(lookups) => results,
        };

        let mut seen = HashSet::new();
        let mut total = Decimal::zero();
        for (counter, result) in counters.iter().zip(results) {
            match result {
                Ok(pools) => {
                    for pool in pools {
                        if seen.insert(pool.id.clone()) {
                            total += pool.reserve_of(&snapshot.fund_token);
                        }
                    }
                }
                Err(e) => warn!(counter = %counter, "Pooled shares unavailable: {}", e),
            }
        }
        Ok(total)
    }

    async fn bid_price(
        &self,
        ctx: &CalculationContext<'_>,
        fund: &AssetInfo,
    ) -> Result<Decimal, CalculatorError> {
        match self
            .prices
            .get_bid_price(fund, &ctx.snapshot.primary_reference, ctx.cancel)
            .await
        {
            Ok(price) => Ok(price),
            Err(PricingError::Cancelled) => Err(CalculatorError::Cancelled),
            Err(e) => {
                warn!(asset = %fund, "Market bid price unavailable: {}", e);
                Ok(Decimal::zero())
            }
        }
    }

    async fn cross_rate(&self, ctx: &CalculationContext<'_>) -> Result<Decimal, CalculatorError> {
        let snapshot = ctx.snapshot;
        match self
            .prices
            .get_price(
                &snapshot.primary_reference,
                &snapshot.secondary_reference,
                Decimal::one(),
                ctx.cancel,
            )
            .await
        {
            Ok(price) => Ok(price.price),
            Err(PricingError::Cancelled) => Err(CalculatorError::Cancelled),
            Err(e) => {
                warn!("Reference cross rate unavailable: {}", e);
                Ok(Decimal::zero())
            }
        }
    }
}

#[async_trait]
impl Calculator for MarketCalculator {
    fn name(&self) -> &'static str {
        "market"
    }

    fn ids(&self) -> BTreeSet<IndicatorId> {
        id_set(&[
            ids::CIRCULATING_SUPPLY,
            ids::MARKET_BID_PRICE,
            ids::ISSUER_HELD_SHARES,
            ids::POOLED_SHARES,
            ids::REFERENCE_CROSS_RATE,
        ])
    }

    fn dependencies(&self) -> BTreeSet<IndicatorId> {
        id_set(&[ids::TOTAL_SHARES])
    }

    async fn calculate(
        &self,
        ctx: &CalculationContext<'_>,
        computed: &ComputedIndicators,
    ) -> Result<Vec<Indicator>, CalculatorError> {
        let fund = &ctx.snapshot.fund_token;
        let (issuer_held, pooled, bid, cross) = tokio::try_join!(
            self.issuer_held(ctx),
            self.pooled(ctx),
            self.bid_price(ctx, fund),
            self.cross_rate(ctx),
        )?;

        let circulating =
            (computed.value(ids::TOTAL_SHARES) - issuer_held - pooled).clamp_non_negative();

        Ok(vec![
            Indicator::new(ids::CIRCULATING_SUPPLY, "Circulating supply", circulating, "shares"),
            Indicator::new(ids::MARKET_BID_PRICE, "Market bid price", bid, ""),
            Indicator::new(ids::ISSUER_HELD_SHARES, "Issuer held shares", issuer_held, "shares"),
            Indicator::new(ids::POOLED_SHARES, "Shares in liquidity pools", pooled, "shares"),
            Indicator::new(ids::REFERENCE_CROSS_RATE, "Reference cross rate", cross, ""),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceAssets;
    use crate::datasource::MockLedger;
    use crate::domain::{AccountId, FundSnapshot, Orderbook, OrderbookLevel};
    use crate::pricing::PriceCache;
    use chrono::Utc;
    use std::str::FromStr;
    use tokio_util::sync::CancellationToken;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_test_snapshot(fund: &AssetInfo, brl: &AssetInfo) -> FundSnapshot {
        FundSnapshot {
            taken_at: Utc::now(),
            fund_token: fund.clone(),
            companion_token: None,
            issuer: AccountId::new("GISSUER"),
            primary_reference: brl.clone(),
            secondary_reference: AssetInfo::native(),
            share_supply: dec("1000"),
            share_price: dec("1"),
            accounts: vec![],
            dividends: vec![],
            holders: vec![],
        }
    }

    async fn run(mock: MockLedger, total_shares: &str) -> Vec<Indicator> {
        let cancel = CancellationToken::new();
        run_with_cancel(mock, total_shares, &cancel).await.unwrap()
    }

    async fn run_with_cancel(
        mock: MockLedger,
        total_shares: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Indicator>, CalculatorError> {
        let fund = AssetInfo::credit("FUND", "GISSUER").unwrap();
        let brl = AssetInfo::credit("BRL", "GANCHOR").unwrap();
        let mock = Arc::new(mock);
        let prices = Arc::new(PriceDiscoveryService::new(
            mock.clone(),
            Arc::new(PriceCache::new()),
            ReferenceAssets {
                primary: brl.clone(),
                secondary: AssetInfo::native(),
            },
            20,
        ));
        let calculator = MarketCalculator::new(prices, mock.clone(), mock);
        let snapshot = make_test_snapshot(&fund, &brl);
        let ctx = CalculationContext {
            snapshot: &snapshot,
            history: None,
            cancel,
        };
        let computed: ComputedIndicators =
            [(ids::TOTAL_SHARES, dec(total_shares))].into_iter().collect();
        calculator.calculate(&ctx, &computed).await
    }

    fn value(out: &[Indicator], id: IndicatorId) -> Decimal {
        out.iter().find(|i| i.id == id).unwrap().value
    }

    #[tokio::test]
    async fn test_circulating_supply_subtracts_issuer_and_pools() {
        let fund = AssetInfo::credit("FUND", "GISSUER").unwrap();
        let brl = AssetInfo::credit("BRL", "GANCHOR").unwrap();
        let mock = MockLedger::new()
            .with_account(&AccountId::new("GISSUER"), vec![(fund.clone(), dec("100"))], vec![])
            .with_pool("p1", vec![(fund.clone(), dec("50")), (brl.clone(), dec("60"))])
            .with_pool("p2", vec![(fund.clone(), dec("25")), (AssetInfo::native(), dec("90"))])
            .with_orderbook(
                &fund,
                &brl,
                Orderbook {
                    bids: vec![OrderbookLevel {
                        price: dec("1.1"),
                        amount: dec("10"),
                    }],
                    asks: vec![],
                },
            )
            .with_path_rate(&brl, &AssetInfo::native(), dec("4"), vec![]);

        let out = run(mock, "1000").await;
        assert_eq!(value(&out, ids::ISSUER_HELD_SHARES), dec("100"));
        assert_eq!(value(&out, ids::POOLED_SHARES), dec("75"));
        assert_eq!(value(&out, ids::CIRCULATING_SUPPLY), dec("825"));
        assert_eq!(value(&out, ids::MARKET_BID_PRICE), dec("1.1"));
        assert_eq!(value(&out, ids::REFERENCE_CROSS_RATE), dec("4"));
    }

    #[tokio::test]
    async fn test_circulating_supply_clamped_and_lookups_degrade_to_zero() {
        let fund = AssetInfo::credit("FUND", "GISSUER").unwrap();
        let mock = MockLedger::new().with_account(
            &AccountId::new("GISSUER"),
            vec![(fund, dec("5000"))],
            vec![],
        );
        let out = run(mock, "1000").await;
        assert_eq!(value(&out, ids::CIRCULATING_SUPPLY), Decimal::zero());
        assert_eq!(value(&out, ids::MARKET_BID_PRICE), Decimal::zero());
        assert_eq!(value(&out, ids::REFERENCE_CROSS_RATE), Decimal::zero());
    }

    #[tokio::test]
    async fn test_cancel_aborts_slow_ledger_lookups() {
        let fund = AssetInfo::credit("FUND", "GISSUER").unwrap();
        let mock = MockLedger::new()
            .with_account(&AccountId::new("GISSUER"), vec![(fund, dec("100"))], vec![])
            .with_latency(std::time::Duration::from_secs(3));
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let result = run_with_cancel(mock, "1000", &cancel).await;
        assert!(matches!(result, Err(CalculatorError::Cancelled)));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }
}
