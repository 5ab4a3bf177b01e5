//! Direct order-book and AMM pool pricing.

use super::PricingError;
use crate::datasource::{DataSourceError, LedgerQuoteSource};
use crate::domain::{
    AssetInfo, BookSide, Decimal, LiquidityPool, Orderbook, OrderbookDetails, PoolDetails,
    PriceProvenance, TokenPairPrice,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves a spot rate from the direct order book and liquidity pools, keeping the cheaper one.
#[derive(Debug, Clone)]
pub struct OrderbookAmmFinder {
    source: Arc<dyn LedgerQuoteSource>,
    depth: u32,
}

impl OrderbookAmmFinder {
    pub fn new(source: Arc<dyn LedgerQuoteSource>, depth: u32) -> Self {
        Self { source, depth }
    }

    /// Spot price of one unit of `asset` in `base`.
    ///
    /// The book contributes its best ask, or its best bid when there are no asks.
    /// The pool price is compared as an ask; the lower of the two wins.
    pub async fn find_price(
        &self,
        asset: &AssetInfo,
        base: &AssetInfo,
    ) -> Result<TokenPairPrice, PricingError> {
        let (book, pools) = tokio::join!(
            self.source.fetch_orderbook(asset, base, self.depth),
            self.source.fetch_liquidity_pools(asset, base),
        );

        let mut transport_error: Option<DataSourceError> = None;

        let book_candidate = match book {
            Ok(book) => book_price(&book).map(|(side, price)| {
                (
                    price,
                    PriceProvenance::Orderbook(OrderbookDetails {
                        side,
                        orderbook: book,
                    }),
                )
            }),
            Err(e) => {
                warn!(asset = %asset, base = %base, "Order book query failed: {}", e);
                transport_error = Some(e);
                None
            }
        };

        let pool_candidate = match pools {
            Ok(pools) => pool_price(&pools, asset).map(|(price, pool)| {
                (
                    price,
                    PriceProvenance::LiquidityPool(PoolDetails {
                        pool_id: pool.id.clone(),
                        reserves: pool.reserves.clone(),
                    }),
                )
            }),
            Err(e) => {
                warn!(asset = %asset, base = %base, "Liquidity pool query failed: {}", e);
                transport_error = Some(e);
                None
            }
        };

        let chosen = match (book_candidate, pool_candidate) {
            (Some(book), Some(pool)) => {
                if pool.0 < book.0 {
                    Some(pool)
                } else {
                    Some(book)
                }
            }
            (book, pool) => book.or(pool),
        };

        match chosen {
            Some((price, provenance)) => {
                debug!(asset = %asset, base = %base, price = %price, "Order book/AMM price");
                Ok(TokenPairPrice {
                    base: asset.clone(),
                    quote: base.clone(),
                    price,
                    source_amount_used: Decimal::one(),
                    discovered_at: Utc::now(),
                    provenance,
                })
            }
            None => match transport_error {
                Some(e) => Err(e.into()),
                None => Err(PricingError::no_price(asset, base)),
            },
        }
    }

    /// Best standing bid for `asset` in `base`.
    pub async fn best_bid(&self, asset: &AssetInfo, base: &AssetInfo) -> Result<Decimal, PricingError> {
        let book = self.source.fetch_orderbook(asset, base, self.depth).await?;
        book.best_bid()
            .map(|level| level.price)
            .ok_or_else(|| PricingError::no_price(asset, base))
    }
}

fn book_price(book: &Orderbook) -> Option<(BookSide, Decimal)> {
    book.best_ask()
        .map(|level| (BookSide::Ask, level.price))
        .or_else(|| book.best_bid().map(|level| (BookSide::Bid, level.price)))
}

/// Spot price from the usable pool holding the deepest `asset` reserve.
fn pool_price<'a>(pools: &'a [LiquidityPool], asset: &AssetInfo) -> Option<(Decimal, &'a LiquidityPool)> {
    pools
        .iter()
        .filter_map(|pool| pool.spot_price(asset).map(|price| (price, pool)))
        .filter(|(price, _)| price.is_positive())
        .max_by_key(|(_, pool)| pool.reserve_of(asset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::mock::{MockLedger, MockOperation};
    use crate::domain::OrderbookLevel;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn fund() -> AssetInfo {
        AssetInfo::credit("FUND", "GISSUER").unwrap()
    }

    fn level(price: &str) -> OrderbookLevel {
        OrderbookLevel {
            price: dec(price),
            amount: dec("100"),
        }
    }

    #[tokio::test]
    async fn test_ask_preferred_over_bid() {
        let book = Orderbook {
            bids: vec![level("0.4")],
            asks: vec![level("0.45")],
        };
        let mock = MockLedger::new().with_orderbook(&fund(), &AssetInfo::native(), book);
        let finder = OrderbookAmmFinder::new(Arc::new(mock), 20);

        let price = finder.find_price(&fund(), &AssetInfo::native()).await.unwrap();
        assert_eq!(price.price, dec("0.45"));
        assert!(matches!(
            price.provenance,
            PriceProvenance::Orderbook(OrderbookDetails {
                side: BookSide::Ask,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_lower_pool_price_wins() {
        let book = Orderbook {
            bids: vec![],
            asks: vec![level("0.6")],
        };
        let mock = MockLedger::new()
            .with_orderbook(&fund(), &AssetInfo::native(), book)
            .with_pool("pool1", vec![(fund(), dec("1000")), (AssetInfo::native(), dec("500"))]);
        let finder = OrderbookAmmFinder::new(Arc::new(mock), 20);

        let price = finder.find_price(&fund(), &AssetInfo::native()).await.unwrap();
        assert_eq!(price.price, dec("0.5"));
        assert!(matches!(price.provenance, PriceProvenance::LiquidityPool(_)));
    }

    #[tokio::test]
    async fn test_pool_used_when_book_fails() {
        let mock = MockLedger::new()
            .with_pool("pool1", vec![(fund(), dec("1000")), (AssetInfo::native(), dec("500"))])
            .with_failure(MockOperation::Orderbook, DataSourceError::RateLimited);
        let finder = OrderbookAmmFinder::new(Arc::new(mock), 20);

        let price = finder.find_price(&fund(), &AssetInfo::native()).await.unwrap();
        assert_eq!(price.price, dec("0.5"));
    }

    #[tokio::test]
    async fn test_empty_zero_reserve_pool_is_no_price() {
        let mock = MockLedger::new()
            .with_pool("pool1", vec![(fund(), dec("0")), (AssetInfo::native(), dec("500"))]);
        let finder = OrderbookAmmFinder::new(Arc::new(mock), 20);

        let result = finder.find_price(&fund(), &AssetInfo::native()).await;
        assert!(matches!(result, Err(PricingError::NoPrice { .. })));
    }

    #[tokio::test]
    async fn test_best_bid_requires_bids() {
        let book = Orderbook {
            bids: vec![],
            asks: vec![level("0.6")],
        };
        let mock = MockLedger::new().with_orderbook(&fund(), &AssetInfo::native(), book);
        let finder = OrderbookAmmFinder::new(Arc::new(mock), 20);

        let result = finder.best_bid(&fund(), &AssetInfo::native()).await;
        assert!(matches!(result, Err(PricingError::NoPrice { .. })));
    }
}
