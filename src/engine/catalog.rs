//! Canonical indicator names and units.

use super::ids;
use crate::domain::IndicatorId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub unit: String,
}

/// Canonical `{name, unit}` per indicator id. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct IndicatorCatalog {
    entries: BTreeMap<IndicatorId, CatalogEntry>,
}

impl IndicatorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, id: IndicatorId, name: &str, unit: &str) -> Self {
        self.entries.insert(
            id,
            CatalogEntry {
                name: name.to_string(),
                unit: unit.to_string(),
            },
        );
        self
    }

    pub fn get(&self, id: IndicatorId) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalog of the standard calculators, with currency units named after
    /// the reference asset codes.
    pub fn standard(primary_code: &str, secondary_code: &str) -> Self {
        Self::new()
            .with_entry(ids::TOTAL_ASSETS_PRIMARY, "Total assets value", primary_code)
            .with_entry(ids::TOTAL_ASSETS_SECONDARY, "Total assets value", secondary_code)
            .with_entry(ids::TOTAL_SHARES, "Total shares", "shares")
            .with_entry(ids::SHARE_PRICE, "Share price", primary_code)
            .with_entry(ids::ACCOUNT_COUNT, "Fund accounts", "count")
            .with_entry(ids::DISTINCT_ASSET_COUNT, "Distinct assets held", "count")
            .with_entry(ids::MARKET_PRICED_VALUE, "Market-priced assets value", primary_code)
            .with_entry(ids::MANUALLY_VALUED_VALUE, "Manually valued assets value", primary_code)
            .with_entry(ids::REFERENCE_CASH_VALUE, "Reference cash value", primary_code)
            .with_entry(ids::CIRCULATING_SUPPLY, "Circulating supply", "shares")
            .with_entry(ids::MARKET_BID_PRICE, "Market bid price", primary_code)
            .with_entry(ids::ISSUER_HELD_SHARES, "Issuer held shares", "shares")
            .with_entry(ids::POOLED_SHARES, "Shares in liquidity pools", "shares")
            .with_entry(ids::REFERENCE_CROSS_RATE, "Reference cross rate", secondary_code)
            .with_entry(ids::MARKET_CAP, "Market capitalization", primary_code)
            .with_entry(ids::BOOK_VALUE_PER_SHARE, "Book value per share", primary_code)
            .with_entry(ids::PRICE_TO_BOOK, "Price to book", "ratio")
            .with_entry(ids::CIRCULATING_MARKET_CAP, "Circulating market capitalization", primary_code)
            .with_entry(ids::MARKET_TO_BOOK, "Market price to book", "ratio")
            .with_entry(ids::FREE_FLOAT, "Free float", "%")
            .with_entry(ids::DIVIDENDS_PAID_12M, "Dividends paid (12 months)", primary_code)
            .with_entry(ids::DIVIDEND_PER_SHARE_12M, "Dividend per share (12 months)", primary_code)
            .with_entry(ids::DIVIDEND_YIELD, "Dividend yield", "%")
            .with_entry(ids::DISTRIBUTION_COUNT_12M, "Distributions (12 months)", "count")
            .with_entry(ids::DIVIDEND_REINVESTMENT_RATE, "Dividend reinvestment rate", "%")
            .with_entry(ids::SHARE_PRICE_1Y_AGO, "Share price one year ago", primary_code)
            .with_entry(ids::ROI_12M, "Return on investment (12 months)", "%")
            .with_entry(ids::TOTAL_RETURN_12M, "Total return (12 months)", "%")
            .with_entry(ids::LARGEST_HOLDING_WEIGHT, "Largest holding weight", "%")
            .with_entry(ids::MANUAL_VALUATION_SHARE, "Manually valued share of assets", "%")
            .with_entry(ids::CASH_RATIO, "Cash ratio", "%")
            .with_entry(ids::NAV_CHANGE_12M, "Net asset value change (12 months)", "%")
            .with_entry(ids::HOLDER_COUNT, "Holders", "count")
            .with_entry(ids::HOLDERS_WITH_ONE_SHARE, "Holders with at least one share", "count")
            .with_entry(ids::AVERAGE_SHARES_PER_HOLDER, "Average shares per holder", "shares")
            .with_entry(ids::TOP10_CONCENTRATION, "Top 10 holder concentration", "%")
            .with_entry(ids::HOLDERS_PAID_DIVIDENDS, "Holders paid dividends", "count")
    }
}
