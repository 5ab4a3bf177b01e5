//! In-memory external quotes and indicator history.

use super::{DataSourceError, ExternalQuoteStore, HistoricalIndicatorAccessor};
use crate::domain::{Decimal, ExternalSymbol, IndicatorId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// External quotes loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticQuoteStore {
    quotes: HashMap<ExternalSymbol, Decimal>,
}

impl StaticQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, symbol: ExternalSymbol, price: Decimal) -> Self {
        self.quotes.insert(symbol, price);
        self
    }
}

#[async_trait]
impl ExternalQuoteStore for StaticQuoteStore {
    async fn get_quote(&self, symbol: ExternalSymbol) -> Result<Decimal, DataSourceError> {
        self.quotes
            .get(&symbol)
            .copied()
            .ok_or_else(|| DataSourceError::NotFound(format!("quote for {}", symbol)))
    }
}

/// Indicator history kept in memory, ordered by time per indicator.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    values: BTreeMap<IndicatorId, BTreeMap<DateTime<Utc>, Decimal>>,
}

impl StaticHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, id: IndicatorId, at: DateTime<Utc>, value: Decimal) -> Self {
        self.values.entry(id).or_default().insert(at, value);
        self
    }
}

#[async_trait]
impl HistoricalIndicatorAccessor for StaticHistory {
    async fn indicator_value_at(
        &self,
        id: IndicatorId,
        at: DateTime<Utc>,
    ) -> Result<Option<Decimal>, DataSourceError> {
        Ok(self
            .values
            .get(&id)
            .and_then(|series| series.range(..=at).next_back())
            .map(|(_, value)| *value))
    }
}
