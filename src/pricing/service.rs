//! Price discovery front: cache, two-source spot race and cross-rate derivation.

use super::{OrderbookAmmFinder, PathPriceFinder, PriceCache, PriceCacheKey, PricingError};
use crate::config::ReferenceAssets;
use crate::datasource::LedgerQuoteSource;
use crate::domain::{
    AssetInfo, BestDetails, CrossRateDetails, Decimal, PathDetails, PriceProvenance, PriceSource,
    TokenPairPrice, TokenPrices,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PriceDiscoveryService {
    path_finder: PathPriceFinder,
    orderbook_finder: OrderbookAmmFinder,
    cache: Arc<PriceCache>,
    references: ReferenceAssets,
}

impl PriceDiscoveryService {
    pub fn new(
        source: Arc<dyn LedgerQuoteSource>,
        cache: Arc<PriceCache>,
        references: ReferenceAssets,
        orderbook_depth: u32,
    ) -> Self {
        Self {
            path_finder: PathPriceFinder::new(source.clone()),
            orderbook_finder: OrderbookAmmFinder::new(source, orderbook_depth),
            cache,
            references,
        }
    }

    pub fn references(&self) -> &ReferenceAssets {
        &self.references
    }

    /// Price of `asset` in `base`.
    ///
    /// An `amount` of one is a spot query and races both sources, keeping the
    /// higher price (ties go to the path source). Any other amount is a value
    /// query answered by the path finder alone.
    pub async fn get_price(
        &self,
        asset: &AssetInfo,
        base: &AssetInfo,
        amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<TokenPairPrice, PricingError> {
        if cancel.is_cancelled() {
            return Err(PricingError::Cancelled);
        }
        if asset == base {
            return Ok(identity_price(asset, amount));
        }

        let key = PriceCacheKey::new(asset, base, amount);
        if let Some(cached) = self.cache.get(&key).await {
            debug!(asset = %asset, base = %base, amount = %amount, "Price cache hit");
            return Ok(cached);
        }
        debug!(asset = %asset, base = %base, amount = %amount, "Price cache miss");

        let price = if amount.is_one() {
            self.race_spot(asset, base, cancel).await?
        } else {
            tokio::select! {
                _ = cancel.cancelled() => return Err(PricingError::Cancelled),
                result = self.path_finder.find_price(asset, base, amount) => result?,
            }
        };

        self.cache.set(key, price.clone()).await;
        Ok(price)
    }

    /// Best standing bid for `asset` in `base`, from the order book only.
    pub async fn get_bid_price(
        &self,
        asset: &AssetInfo,
        base: &AssetInfo,
        cancel: &CancellationToken,
    ) -> Result<Decimal, PricingError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(PricingError::Cancelled),
            result = self.orderbook_finder.best_bid(asset, base) => result,
        }
    }

    /// Spot prices of `asset` in both reference currencies and the value of `balance`.
    ///
    /// A reference that did not resolve is derived from the other through the
    /// spot rate between the two references.
    pub async fn get_token_prices(
        &self,
        asset: &AssetInfo,
        balance: Decimal,
        cancel: &CancellationToken,
    ) -> Result<TokenPrices, PricingError> {
        let primary = &self.references.primary;
        let secondary = &self.references.secondary;
        let one = Decimal::one();

        let (in_primary, in_secondary) = tokio::join!(
            self.get_price(asset, primary, one, cancel),
            self.get_price(asset, secondary, one, cancel),
        );

        let (primary_price, secondary_price) = match (in_primary, in_secondary) {
            (Ok(p), Ok(s)) => (p, s),
            (Ok(p), Err(e)) => {
                debug!(asset = %asset, "No {} price ({}), deriving through cross rate", secondary, e);
                let cross = self.get_price(primary, secondary, one, cancel).await?;
                let derived = derive_price(&p, secondary, cross.price);
                (p, derived)
            }
            (Err(e), Ok(s)) => {
                debug!(asset = %asset, "No {} price ({}), deriving through cross rate", primary, e);
                let cross = self.get_price(primary, secondary, one, cancel).await?;
                let inverse = one
                    .checked_div(cross.price)
                    .ok_or_else(|| PricingError::no_price(asset, primary))?;
                let derived = derive_price(&s, primary, inverse);
                (derived, s)
            }
            (Err(a), Err(b)) => {
                warn!(asset = %asset, "No price in either reference currency");
                return Err(PricingError::most_severe(a, b));
            }
        };

        Ok(TokenPrices {
            price_primary: primary_price.price,
            price_secondary: secondary_price.price,
            value_primary: (primary_price.price * balance).round_ledger(),
            value_secondary: (secondary_price.price * balance).round_ledger(),
            provenance_primary: primary_price.provenance,
            provenance_secondary: secondary_price.provenance,
        })
    }

    async fn race_spot(
        &self,
        asset: &AssetInfo,
        base: &AssetInfo,
        cancel: &CancellationToken,
    ) -> Result<TokenPairPrice, PricingError> {
        let (path_tx, path_rx) = oneshot::channel();
        let (book_tx, book_rx) = oneshot::channel();

        let path_task = {
            let finder = self.path_finder.clone();
            let (asset, base) = (asset.clone(), base.clone());
            tokio::spawn(async move {
                let _ = path_tx.send(finder.find_price(&asset, &base, Decimal::one()).await);
            })
        };
        let book_task = {
            let finder = self.orderbook_finder.clone();
            let (asset, base) = (asset.clone(), base.clone());
            tokio::spawn(async move {
                let _ = book_tx.send(finder.find_price(&asset, &base).await);
            })
        };

        let (path_result, book_result) = tokio::select! {
            _ = cancel.cancelled() => {
                path_task.abort();
                book_task.abort();
                return Err(PricingError::Cancelled);
            }
            results = async { tokio::join!(path_rx, book_rx) } => results,
        };
        let path_result = path_result.unwrap_or(Err(PricingError::Cancelled));
        let book_result = book_result.unwrap_or(Err(PricingError::Cancelled));

        match (path_result, book_result) {
            (Ok(path), Ok(book)) => Ok(choose_best(path, book)),
            (Ok(path), Err(e)) => {
                debug!(asset = %asset, base = %base, "Order book source abstained: {}", e);
                Ok(path)
            }
            (Err(e), Ok(book)) => {
                debug!(asset = %asset, base = %base, "Path source abstained: {}", e);
                Ok(book)
            }
            (Err(a), Err(b)) => Err(PricingError::most_severe(a, b)),
        }
    }
}

/// Keep the numerically higher of the two prices; ties go to the path.
fn choose_best(path: TokenPairPrice, book: TokenPairPrice) -> TokenPairPrice {
    let chosen = if book.price > path.price {
        PriceSource::Orderbook
    } else {
        PriceSource::Path
    };
    let price = match chosen {
        PriceSource::Path => path.price,
        PriceSource::Orderbook => book.price,
    };
    info!(
        asset = %path.base,
        base = %path.quote,
        path_price = %path.price,
        orderbook_price = %book.price,
        chosen = ?chosen,
        "Spot race resolved"
    );

    TokenPairPrice {
        base: path.base,
        quote: path.quote,
        price,
        source_amount_used: Decimal::one(),
        discovered_at: Utc::now(),
        provenance: PriceProvenance::Best(BestDetails {
            path_price: path.price,
            orderbook_price: book.price,
            chosen,
            path: Box::new(path.provenance),
            orderbook: Box::new(book.provenance),
        }),
    }
}

fn derive_price(
    leg: &TokenPairPrice,
    target: &AssetInfo,
    cross_rate: Decimal,
) -> TokenPairPrice {
    TokenPairPrice {
        base: leg.base.clone(),
        quote: target.clone(),
        price: leg.price * cross_rate,
        source_amount_used: leg.source_amount_used,
        discovered_at: Utc::now(),
        provenance: PriceProvenance::CrossRate(CrossRateDetails {
            through: leg.quote.clone(),
            cross_rate,
            leg: Box::new(leg.provenance.clone()),
        }),
    }
}

fn identity_price(asset: &AssetInfo, amount: Decimal) -> TokenPairPrice {
    TokenPairPrice {
        base: asset.clone(),
        quote: asset.clone(),
        price: Decimal::one(),
        source_amount_used: amount,
        discovered_at: Utc::now(),
        provenance: PriceProvenance::Path(PathDetails {
            source_amount: amount,
            destination_amount: amount,
            hops: Vec::new(),
        }),
    }
}
