//! Share holder participation metrics.

use super::{ids, id_set, CalculationContext, Calculator, CalculatorError, ComputedIndicators};
use crate::domain::{AccountId, AssetInfo, Decimal, FundSnapshot, Indicator, IndicatorId};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

const TOP_HOLDERS: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenomicsCalculator;

impl TokenomicsCalculator {
    pub fn new() -> Self {
        Self
    }
}

/// Positive balances of `asset` per holder, fund issuer excluded.
fn balances_of(snapshot: &FundSnapshot, asset: &AssetInfo) -> BTreeMap<AccountId, Decimal> {
    let mut balances: BTreeMap<AccountId, Decimal> = BTreeMap::new();
    for holder in snapshot
        .holders
        .iter()
        .filter(|h| &h.asset == asset && h.account != snapshot.issuer)
    {
        *balances.entry(holder.account.clone()).or_default() += holder.balance;
    }
    balances.retain(|_, balance| balance.is_positive());
    balances
}

fn accounts_with_one_share(balances: &BTreeMap<AccountId, Decimal>) -> impl Iterator<Item = &AccountId> {
    balances
        .iter()
        .filter(|(_, balance)| **balance >= Decimal::one())
        .map(|(account, _)| account)
}

#[async_trait]
impl Calculator for TokenomicsCalculator {
    fn name(&self) -> &'static str {
        "tokenomics"
    }

    fn ids(&self) -> BTreeSet<IndicatorId> {
        id_set(&[
            ids::HOLDER_COUNT,
            ids::HOLDERS_WITH_ONE_SHARE,
            ids::AVERAGE_SHARES_PER_HOLDER,
            ids::TOP10_CONCENTRATION,
            ids::HOLDERS_PAID_DIVIDENDS,
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
        let snapshot = ctx.snapshot;
        let total_shares = computed.value(ids::TOTAL_SHARES);

        let fund_balances = balances_of(snapshot, &snapshot.fund_token);
        let holder_count = Decimal::from(fund_balances.len());

        let companion_balances = snapshot
            .companion_token
            .as_ref()
            .map(|companion| balances_of(snapshot, companion))
            .unwrap_or_default();
        // An account holding both share classes counts once.
        let participants: BTreeSet<&AccountId> = accounts_with_one_share(&fund_balances)
            .chain(accounts_with_one_share(&companion_balances))
            .collect();

        let mut sorted: Vec<Decimal> = fund_balances.values().copied().collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let top: Decimal = sorted.iter().take(TOP_HOLDERS).sum();

        Ok(vec![
            Indicator::new(ids::HOLDER_COUNT, "Holders", holder_count, "count"),
            Indicator::new(
                ids::HOLDERS_WITH_ONE_SHARE,
                "Holders with at least one share",
                Decimal::from(participants.len()),
                "count",
            ),
            Indicator::new(
                ids::AVERAGE_SHARES_PER_HOLDER,
                "Average shares per holder",
                total_shares.safe_div(holder_count),
                "shares",
            ),
            Indicator::new(
                ids::TOP10_CONCENTRATION,
                "Top 10 holder concentration",
                top.percent_of(total_shares),
                "%",
            ),
            // Per-holder payment history is not tracked.
            Indicator::new(
                ids::HOLDERS_PAID_DIVIDENDS,
                "Holders paid dividends",
                Decimal::zero(),
                "count",
            ),
        ])
    }
}
