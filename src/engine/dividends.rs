//! Dividend metrics over the trailing twelve months.

use super::{ids, id_set, CalculationContext, Calculator, CalculatorError, ComputedIndicators};
use crate::domain::{Decimal, FundSnapshot, Indicator, IndicatorId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

pub(crate) fn one_year_before(at: DateTime<Utc>) -> DateTime<Utc> {
    at - Duration::days(365)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DividendsCalculator;

impl DividendsCalculator {
    pub fn new() -> Self {
        Self
    }
}

/// Distributions in `(taken_at - 1y, taken_at]`.
fn trailing_distributions(snapshot: &FundSnapshot) -> impl Iterator<Item = Decimal> + '_ {
    let start = one_year_before(snapshot.taken_at);
    snapshot
        .dividends
        .iter()
        .filter(move |d| d.paid_at > start && d.paid_at <= snapshot.taken_at)
        .map(|d| d.amount)
}

#[async_trait]
impl Calculator for DividendsCalculator {
    fn name(&self) -> &'static str {
        "dividends"
    }

    fn ids(&self) -> BTreeSet<IndicatorId> {
        id_set(&[
            ids::DIVIDENDS_PAID_12M,
            ids::DIVIDEND_PER_SHARE_12M,
            ids::DIVIDEND_YIELD,
            ids::DISTRIBUTION_COUNT_12M,
            ids::DIVIDEND_REINVESTMENT_RATE,
        ])
    }

    fn dependencies(&self) -> BTreeSet<IndicatorId> {
        id_set(&[ids::TOTAL_SHARES, ids::SHARE_PRICE])
    }

    async fn calculate(
        &self,
        ctx: &CalculationContext<'_>,
        computed: &ComputedIndicators,
    ) -> Result<Vec<Indicator>, CalculatorError> {
        let paid: Decimal = trailing_distributions(ctx.snapshot).sum();
        let count = trailing_distributions(ctx.snapshot).count();
        let per_share = paid.safe_div(computed.value(ids::TOTAL_SHARES));
        let dividend_yield = per_share.percent_of(computed.value(ids::SHARE_PRICE));

        Ok(vec![
            Indicator::new(ids::DIVIDENDS_PAID_12M, "Dividends paid (12 months)", paid, ""),
            Indicator::new(
                ids::DIVIDEND_PER_SHARE_12M,
                "Dividend per share (12 months)",
                per_share,
                "",
            ),
            Indicator::new(ids::DIVIDEND_YIELD, "Dividend yield", dividend_yield, "%"),
            Indicator::new(
                ids::DISTRIBUTION_COUNT_12M,
                "Distributions (12 months)",
                Decimal::from(count),
                "count",
            ),
            // Reinvestments are not tracked.
            Indicator::new(
                ids::DIVIDEND_REINVESTMENT_RATE,
                "Dividend reinvestment rate",
                Decimal::zero(),
                "%",
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountId, AssetInfo, DividendDistribution};
    use chrono::TimeZone;
    use std::str::FromStr;
    use tokio_util::sync::CancellationToken;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_trailing_window_and_yield() {
        let taken_at = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        let paid = |y, m, amount: &str| DividendDistribution {
            paid_at: Utc.with_ymd_and_hms(y, m, 15, 0, 0, 0).unwrap(),
            amount: dec(amount),
        };
        let snapshot = FundSnapshot {
            taken_at,
            fund_token: AssetInfo::credit("FUND", "GISSUER").unwrap(),
            companion_token: None,
            issuer: AccountId::new("GISSUER"),
            primary_reference: AssetInfo::credit("BRL", "GANCHOR").unwrap(),
            secondary_reference: AssetInfo::native(),
            share_supply: dec("1000"),
            share_price: dec("10"),
            accounts: vec![],
            dividends: vec![
                paid(2024, 3, "999"),
                paid(2024, 9, "300"),
                paid(2025, 3, "200"),
                paid(2025, 9, "777"),
            ],
            holders: vec![],
        };
        let cancel = CancellationToken::new();
        let ctx = CalculationContext {
            snapshot: &snapshot,
            history: None,
            cancel: &cancel,
        };
        let computed: ComputedIndicators = [
            (ids::TOTAL_SHARES, dec("1000")),
            (ids::SHARE_PRICE, dec("10")),
        ]
        .into_iter()
        .collect();

        let out = DividendsCalculator::new()
            .calculate(&ctx, &computed)
            .await
            .unwrap();
        let value = |id| out.iter().find(|i| i.id == id).unwrap().value;

        assert_eq!(value(ids::DIVIDENDS_PAID_12M), dec("500"));
        assert_eq!(value(ids::DIVIDEND_PER_SHARE_12M), dec("0.5"));
        assert_eq!(value(ids::DIVIDEND_YIELD), dec("5"));
        assert_eq!(value(ids::DISTRIBUTION_COUNT_12M), dec("2"));
        assert_eq!(value(ids::DIVIDEND_REINVESTMENT_RATE), Decimal::zero());
    }
}
