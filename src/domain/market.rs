//! Market data returned by the ledger's read-only query surface.

use super::{AssetInfo, Decimal};
use serde::{Deserialize, Serialize};

/// One price level of an order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookLevel {
    /// Price in units of the buying asset per unit of the selling asset.
    pub price: Decimal,
    pub amount: Decimal,
}

/// Order book for a (selling, buying) pair. Levels are best-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orderbook {
    pub bids: Vec<OrderbookLevel>,
    pub asks: Vec<OrderbookLevel>,
}

impl Orderbook {
    pub fn best_bid(&self) -> Option<&OrderbookLevel> {
        self.bids.iter().find(|level| level.price.is_positive())
    }

    pub fn best_ask(&self) -> Option<&OrderbookLevel> {
        self.asks.iter().find(|level| level.price.is_positive())
    }
}

/// A routed exchange path as returned by path-finding queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentPath {
    pub source_amount: Decimal,
    pub destination_amount: Decimal,
    /// Intermediate assets, excluding source and destination.
    pub hops: Vec<AssetInfo>,
}

/// One side of an automated-market-maker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserve {
    pub asset: AssetInfo,
    pub amount: Decimal,
}

/// Automated-market-maker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPool {
    pub id: String,
    pub reserves: Vec<PoolReserve>,
}

impl LiquidityPool {
    /// Spot price of `source` in terms of the other reserve: `R_other / R_source`.
    ///
    /// `None` unless the pool has exactly two reserves, one of them is `source`,
    /// and the source reserve is non-zero.
    pub fn spot_price(&self, source: &AssetInfo) -> Option<Decimal> {
        let [a, b] = self.reserves.as_slice() else {
            return None;
        };
        let (source_reserve, other_reserve) = if &a.asset == source {
            (a, b)
        } else if &b.asset == source {
            (b, a)
        } else {
            return None;
        };
        if source_reserve.amount.is_zero() {
            return None;
        }
        other_reserve.amount.checked_div(source_reserve.amount)
    }

    /// Reserve amount held for `asset`, zero if the pool does not contain it.
    pub fn reserve_of(&self, asset: &AssetInfo) -> Decimal {
        self.reserves
            .iter()
            .filter(|r| &r.asset == asset)
            .map(|r| r.amount)
            .sum()
    }
}

/// A single balance line of a ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub asset: AssetInfo,
    pub balance: Decimal,
}
