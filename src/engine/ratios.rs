//! Ratios derived purely from already computed indicators.

use super::{ids, id_set, CalculationContext, Calculator, CalculatorError, ComputedIndicators};
use crate::domain::{Indicator, IndicatorId};
use async_trait::async_trait;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct RatiosCalculator;

impl RatiosCalculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Calculator for RatiosCalculator {
    fn name(&self) -> &'static str {
        "ratios"
    }

    fn ids(&self) -> BTreeSet<IndicatorId> {
        id_set(&[
            ids::MARKET_CAP,
            ids::BOOK_VALUE_PER_SHARE,
            ids::PRICE_TO_BOOK,
            ids::CIRCULATING_MARKET_CAP,
            ids::MARKET_TO_BOOK,
            ids::FREE_FLOAT,
        ])
    }

    fn dependencies(&self) -> BTreeSet<IndicatorId> {
        id_set(&[
            ids::TOTAL_ASSETS_PRIMARY,
            ids::TOTAL_SHARES,
            ids::SHARE_PRICE,
            ids::CIRCULATING_SUPPLY,
            ids::MARKET_BID_PRICE,
        ])
    }

    async fn calculate(
        &self,
        _ctx: &CalculationContext<'_>,
        computed: &ComputedIndicators,
    ) -> Result<Vec<Indicator>, CalculatorError> {
        let assets = computed.value(ids::TOTAL_ASSETS_PRIMARY);
        let shares = computed.value(ids::TOTAL_SHARES);
        let price = computed.value(ids::SHARE_PRICE);
        let circulating = computed.value(ids::CIRCULATING_SUPPLY);
        let bid = computed.value(ids::MARKET_BID_PRICE);

        let market_cap = shares * price;
        let book_value = assets.safe_div(shares);
        let price_to_book = price.safe_div(book_value);
        let circulating_cap = circulating * bid;
        let market_to_book = bid.safe_div(book_value);
        let free_float = circulating.percent_of(shares);

        Ok(vec![
            Indicator::new(ids::MARKET_CAP, "Market capitalization", market_cap, ""),
            Indicator::new(ids::BOOK_VALUE_PER_SHARE, "Book value per share", book_value, ""),
            Indicator::new(ids::PRICE_TO_BOOK, "Price to book", price_to_book, "ratio"),
            Indicator::new(
                ids::CIRCULATING_MARKET_CAP,
                "Circulating market capitalization",
                circulating_cap,
                "",
            ),
            Indicator::new(ids::MARKET_TO_BOOK, "Market price to book", market_to_book, "ratio"),
            Indicator::new(ids::FREE_FLOAT, "Free float", free_float, "%"),
        ])
    }
}
