//! Discovered prices and their provenance.

use super::{AssetInfo, Decimal, Orderbook, PoolReserve};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Which independent source produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Path,
    Orderbook,
}

/// Side of the order book a price was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Bid,
    Ask,
}

/// Details of a price read from a routed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDetails {
    pub source_amount: Decimal,
    pub destination_amount: Decimal,
    pub hops: Vec<AssetInfo>,
}

/// Details of a price read from the order book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderbookDetails {
    pub side: BookSide,
    pub orderbook: Orderbook,
}

/// Details of a price read from an automated-market-maker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolDetails {
    pub pool_id: String,
    pub reserves: Vec<PoolReserve>,
}

/// Outcome of the path vs. order-book comparison of a spot query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestDetails {
    pub path_price: Decimal,
    pub orderbook_price: Decimal,
    pub chosen: PriceSource,
    pub path: Box<PriceProvenance>,
    pub orderbook: Box<PriceProvenance>,
}

/// Price derived from the other reference currency through a cross rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossRateDetails {
    /// Reference asset the price was originally discovered against.
    pub through: AssetInfo,
    /// Units of the target reference per unit of `through`.
    pub cross_rate: Decimal,
    pub leg: Box<PriceProvenance>,
}

/// Where a price came from. Audit only: never feeds back into the number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceProvenance {
    Path(PathDetails),
    Orderbook(OrderbookDetails),
    LiquidityPool(PoolDetails),
    Best(BestDetails),
    CrossRate(CrossRateDetails),
}

impl PriceProvenance {
    /// Audit representation for output layers.
    pub fn to_audit_json(&self) -> serde_json::Value {
        match self {
            PriceProvenance::Path(d) => json!({
                "type": "path",
                "sourceAmount": d.source_amount,
                "destinationAmount": d.destination_amount,
                "hops": d.hops,
            }),
            PriceProvenance::Orderbook(d) => json!({
                "type": "orderbook",
                "side": d.side,
                "orderbook": d.orderbook,
            }),
            PriceProvenance::LiquidityPool(d) => json!({
                "type": "liquidity_pool",
                "poolId": d.pool_id,
                "reserves": d.reserves,
            }),
            PriceProvenance::Best(d) => json!({
                "type": "best",
                "pathPrice": d.path_price,
                "orderbookPrice": d.orderbook_price,
                "chosen": d.chosen,
                "path": d.path.to_audit_json(),
                "orderbook": d.orderbook.to_audit_json(),
            }),
            PriceProvenance::CrossRate(d) => json!({
                "type": "cross_rate",
                "through": d.through,
                "crossRate": d.cross_rate,
                "leg": d.leg.to_audit_json(),
            }),
        }
    }
}

/// Exchange rate between two assets: `price` units of `quote` per unit of `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPairPrice {
    pub base: AssetInfo,
    pub quote: AssetInfo,
    pub price: Decimal,
    pub source_amount_used: Decimal,
    pub discovered_at: DateTime<Utc>,
    pub provenance: PriceProvenance,
}

/// Prices and values of one holding against both reference currencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPrices {
    pub price_primary: Decimal,
    pub price_secondary: Decimal,
    pub value_primary: Decimal,
    pub value_secondary: Decimal,
    pub provenance_primary: PriceProvenance,
    pub provenance_secondary: PriceProvenance,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_best_audit_json_nests_both_sources() {
        let path = PriceProvenance::Path(PathDetails {
            source_amount: Decimal::from_str("1").unwrap(),
            destination_amount: Decimal::from_str("0.5").unwrap(),
            hops: vec![AssetInfo::native()],
        });
        let book = PriceProvenance::Orderbook(OrderbookDetails {
            side: BookSide::Bid,
            orderbook: Orderbook::default(),
        });
        let best = PriceProvenance::Best(BestDetails {
            path_price: Decimal::from_str("0.5").unwrap(),
            orderbook_price: Decimal::from_str("0.4").unwrap(),
            chosen: PriceSource::Path,
            path: Box::new(path),
            orderbook: Box::new(book),
        });

        let json = best.to_audit_json();
        assert_eq!(json["type"], "best");
        assert_eq!(json["chosen"], "path");
        assert_eq!(json["pathPrice"], "0.5");
        assert_eq!(json["path"]["hops"][0], "native");
        assert_eq!(json["orderbook"]["side"], "bid");
    }
}
