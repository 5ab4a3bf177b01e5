//! Conversion of manual valuations into the reference currency.

use super::ValuationError;
use crate::datasource::ExternalQuoteStore;
use crate::domain::{AssetValuation, Decimal, MassUnit, ResolvedAssetValuation, ValuationValue};
use rust_decimal::Decimal as RustDecimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Grams in one troy ounce; metal quotes are per troy ounce.
pub fn grams_per_troy_ounce() -> Decimal {
    Decimal::new(RustDecimal::new(311_034_768, 7))
}

#[derive(Debug, Clone)]
pub struct ValuationResolver {
    quotes: Arc<dyn ExternalQuoteStore>,
}

impl ValuationResolver {
    pub fn new(quotes: Arc<dyn ExternalQuoteStore>) -> Self {
        Self { quotes }
    }

    pub async fn resolve_valuation(
        &self,
        valuation: &AssetValuation,
        cancel: &CancellationToken,
    ) -> Result<ResolvedAssetValuation, ValuationError> {
        let value = match &valuation.raw_value {
            ValuationValue::ReferenceCurrency { amount } => *amount,
            ValuationValue::ExternalQuote {
                symbol,
                quantity,
                unit,
            } => {
                let quote = tokio::select! {
                    _ = cancel.cancelled() => return Err(ValuationError::Cancelled),
                    quote = self.quotes.get_quote(*symbol) => quote.map_err(|source| {
                        ValuationError::QuoteUnavailable { symbol: *symbol, source }
                    })?,
                };
                let quantity = quantity.unwrap_or_else(Decimal::one);
                let ounces = match unit {
                    Some(MassUnit::G) => quantity.safe_div(grams_per_troy_ounce()),
                    Some(MassUnit::Oz) | None => quantity,
                };
                debug!(
                    token = %valuation.token_code,
                    symbol = %symbol,
                    quote = %quote,
                    quantity = %ounces,
                    "Resolved external valuation"
                );
                (quote * ounces).round_ledger()
            }
        };

        Ok(ResolvedAssetValuation {
            valuation: valuation.clone(),
            value_in_reference_currency: value,
        })
    }
}
