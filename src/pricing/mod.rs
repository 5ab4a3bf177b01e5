//! Price discovery across routed paths, order books and AMM pools.
//!
//! Sub-sources abstain on failure; a query only fails when every source abstained.

use crate::datasource::DataSourceError;
use thiserror::Error;

pub mod cache;
pub mod orderbook;
pub mod path;
pub mod service;

pub use cache::{PriceCache, PriceCacheKey, PRICE_CACHE_TTL};
pub use orderbook::OrderbookAmmFinder;
pub use path::PathPriceFinder;
pub use service::PriceDiscoveryService;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("No price for {base} in {quote}")]
    NoPrice { base: String, quote: String },
    #[error("Price discovery cancelled")]
    Cancelled,
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

impl PricingError {
    pub(crate) fn no_price(base: &crate::domain::AssetInfo, quote: &crate::domain::AssetInfo) -> Self {
        PricingError::NoPrice {
            base: base.canonical(),
            quote: quote.canonical(),
        }
    }

    /// Pick the error to report when two independent sources both failed.
    ///
    /// Cancellation wins over transport failures, which win over a plain lack of price.
    pub(crate) fn most_severe(a: PricingError, b: PricingError) -> PricingError {
        match (&a, &b) {
            (PricingError::Cancelled, _) => a,
            (_, PricingError::Cancelled) => b,
            (PricingError::DataSource(_), _) => a,
            (_, PricingError::DataSource(_)) => b,
            _ => a,
        }
    }
}
