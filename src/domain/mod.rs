//! Domain types for fund pricing and indicator computation.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Asset identity and ledger market data
//! - Price provenance, manual valuations and the priced fund snapshot

pub mod asset;
pub mod decimal;
pub mod indicator;
pub mod market;
pub mod price;
pub mod primitives;
pub mod snapshot;
pub mod valuation;

pub use asset::{AssetInfo, AssetKind, AssetParseError};
pub use decimal::{Decimal, LEDGER_SCALE};
pub use indicator::Indicator;
pub use market::{AccountBalance, LiquidityPool, Orderbook, OrderbookLevel, PaymentPath, PoolReserve};
pub use price::{
    BestDetails, BookSide, CrossRateDetails, OrderbookDetails, PathDetails, PoolDetails,
    PriceProvenance, PriceSource, TokenPairPrice, TokenPrices,
};
pub use primitives::{AccountId, IndicatorId};
pub use snapshot::{
    AccountHoldings, DividendDistribution, FundSnapshot, HolderBalance, Holding, PricingSource,
};
pub use valuation::{
    AssetValuation, ExternalSymbol, MassUnit, ResolvedAssetValuation, ValuationKind,
    ValuationValue,
};
