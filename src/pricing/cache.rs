//! Short-lived memo of discovered prices.

use crate::domain::{AssetInfo, Decimal, TokenPairPrice};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// How long a discovered price is served from cache.
pub const PRICE_CACHE_TTL: Duration = Duration::from_secs(30);

/// Cache key: (base canonical, quote canonical, requested amount).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceCacheKey {
    base: String,
    quote: String,
    amount: String,
}

impl PriceCacheKey {
    pub fn new(base: &AssetInfo, quote: &AssetInfo, amount: Decimal) -> Self {
        Self {
            base: base.canonical(),
            quote: quote.canonical(),
            amount: amount.to_canonical_string(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    price: TokenPairPrice,
    expires_at: Instant,
}

/// TTL cache shared by every concurrent price query.
///
/// Expired entries are treated as misses on read and dropped on the next write.
#[derive(Debug)]
pub struct PriceCache {
    ttl: Duration,
    entries: RwLock<HashMap<PriceCacheKey, CacheEntry>>,
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceCache {
    pub fn new() -> Self {
        Self::with_ttl(PRICE_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &PriceCacheKey) -> Option<TokenPairPrice> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.price.clone())
    }

    pub async fn set(&self, key: PriceCacheKey, price: TokenPairPrice) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                price,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Number of stored entries, expired ones included until the next write.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PathDetails, PriceProvenance};
    use chrono::Utc;
    use std::str::FromStr;

    fn make_test_price(price: &str) -> TokenPairPrice {
        TokenPairPrice {
            base: AssetInfo::credit("FUND", "GISSUER").unwrap(),
            quote: AssetInfo::native(),
            price: Decimal::from_str(price).unwrap(),
            source_amount_used: Decimal::one(),
            discovered_at: Utc::now(),
            provenance: PriceProvenance::Path(PathDetails {
                source_amount: Decimal::one(),
                destination_amount: Decimal::from_str(price).unwrap(),
                hops: vec![],
            }),
        }
    }

    fn key() -> PriceCacheKey {
        PriceCacheKey::new(
            &AssetInfo::credit("FUND", "GISSUER").unwrap(),
            &AssetInfo::native(),
            Decimal::one(),
        )
    }

    #[test]
    fn test_key_uses_canonical_amount() {
        let fund = AssetInfo::credit("FUND", "GISSUER").unwrap();
        let a = PriceCacheKey::new(&fund, &AssetInfo::native(), Decimal::from_str("1.000").unwrap());
        let b = PriceCacheKey::new(&fund, &AssetInfo::native(), Decimal::one());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_get_within_ttl_hits() {
        let cache = PriceCache::new();
        assert!(cache.get(&key()).await.is_none());

        cache.set(key(), make_test_price("0.5")).await;
        let hit = cache.get(&key()).await.unwrap();
        assert_eq!(hit.price, Decimal::from_str("0.5").unwrap());
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss_and_evicted_on_write() {
        let cache = PriceCache::with_ttl(Duration::from_millis(20));
        cache.set(key(), make_test_price("0.5")).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.get(&key()).await.is_none());
        assert_eq!(cache.len().await, 1);

        let other = PriceCacheKey::new(&AssetInfo::native(), &AssetInfo::native(), Decimal::one());
        cache.set(other, make_test_price("1")).await;
        assert_eq!(cache.len().await, 1);
    }
}
