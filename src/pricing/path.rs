//! Pricing through routed multi-hop payment paths.

use super::PricingError;
use crate::datasource::LedgerQuoteSource;
use crate::domain::{AssetInfo, Decimal, PathDetails, PaymentPath, PriceProvenance, TokenPairPrice};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves a rate from strict-send paths, falling back to strict-receive.
#[derive(Debug, Clone)]
pub struct PathPriceFinder {
    source: Arc<dyn LedgerQuoteSource>,
}

impl PathPriceFinder {
    pub fn new(source: Arc<dyn LedgerQuoteSource>) -> Self {
        Self { source }
    }

    /// Price of `asset` in `base` when exchanging exactly `amount` of `asset`.
    pub async fn find_price(
        &self,
        asset: &AssetInfo,
        base: &AssetInfo,
        amount: Decimal,
    ) -> Result<TokenPairPrice, PricingError> {
        if !amount.is_positive() {
            return Err(PricingError::no_price(asset, base));
        }

        let mut transport_error = None;

        match self.source.fetch_strict_send_paths(asset, amount, base).await {
            Ok(paths) => {
                let best = paths
                    .into_iter()
                    .filter(|p| p.destination_amount.is_positive())
                    .max_by_key(|p| p.destination_amount);
                if let Some(path) = best {
                    let price = path.destination_amount.safe_div(amount);
                    debug!(asset = %asset, base = %base, price = %price, "Strict-send path price");
                    return Ok(path_price(asset, base, amount, price, path));
                }
            }
            Err(e) => {
                warn!(asset = %asset, base = %base, "Strict-send path query failed: {}", e);
                transport_error = Some(e);
            }
        }

        match self
            .source
            .fetch_strict_receive_paths(asset, base, amount)
            .await
        {
            Ok(paths) => {
                let best = paths
                    .into_iter()
                    .filter(|p| p.source_amount.is_positive())
                    .min_by_key(|p| p.source_amount);
                if let Some(path) = best {
                    let price = amount.safe_div(path.source_amount);
                    debug!(asset = %asset, base = %base, price = %price, "Strict-receive path price");
                    return Ok(path_price(asset, base, amount, price, path));
                }
            }
            Err(e) => {
                warn!(asset = %asset, base = %base, "Strict-receive path query failed: {}", e);
                transport_error = Some(e);
            }
        }

        match transport_error {
            Some(e) => Err(e.into()),
            None => Err(PricingError::no_price(asset, base)),
        }
    }
}

fn path_price(
    asset: &AssetInfo,
    base: &AssetInfo,
    amount: Decimal,
    price: Decimal,
    path: PaymentPath,
) -> TokenPairPrice {
    TokenPairPrice {
        base: asset.clone(),
        quote: base.clone(),
        price,
        source_amount_used: amount,
        discovered_at: Utc::now(),
        provenance: PriceProvenance::Path(PathDetails {
            source_amount: path.source_amount,
            destination_amount: path.destination_amount,
            hops: path.hops,
        }),
    }
}
