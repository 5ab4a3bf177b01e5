//! Mock ledger for testing without network calls.

use super::{AccountRecord, DataSourceError, LedgerAccountSource, LedgerQuoteSource};
use crate::domain::{
    AccountBalance, AccountId, AssetInfo, Decimal, LiquidityPool, Orderbook, PaymentPath,
    PoolReserve,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Ledger operation, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Orderbook,
    StrictSendPaths,
    StrictReceivePaths,
    LiquidityPools,
    Account,
}

#[derive(Debug, Clone)]
struct PathRate {
    rate: Decimal,
    hops: Vec<AssetInfo>,
}

/// In-memory ledger that returns predefined market and account data.
#[derive(Debug, Default)]
pub struct MockLedger {
    orderbooks: HashMap<(String, String), Orderbook>,
    path_rates: HashMap<(String, String), PathRate>,
    pools: Vec<LiquidityPool>,
    accounts: HashMap<AccountId, AccountRecord>,
    failures: HashMap<MockOperation, DataSourceError>,
    account_failures: HashMap<AccountId, DataSourceError>,
    latency: Option<Duration>,
    calls: HashMap<MockOperation, AtomicUsize>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn pair_key(a: &AssetInfo, b: &AssetInfo) -> (String, String) {
    (a.canonical(), b.canonical())
}

impl MockLedger {
    /// Create a new mock ledger with empty data.
    pub fn new() -> Self {
        let calls = [
            MockOperation::Orderbook,
            MockOperation::StrictSendPaths,
            MockOperation::StrictReceivePaths,
            MockOperation::LiquidityPools,
            MockOperation::Account,
        ]
        .into_iter()
        .map(|op| (op, AtomicUsize::new(0)))
        .collect();
        Self {
            calls,
            ..Default::default()
        }
    }

    /// Set the order book returned for (selling, buying).
    pub fn with_orderbook(mut self, selling: &AssetInfo, buying: &AssetInfo, book: Orderbook) -> Self {
        self.orderbooks.insert(pair_key(selling, buying), book);
        self
    }

    /// Make paths from `source` to `destination` convert at `rate` through `hops`.
    ///
    /// Strict-send paths deliver `amount * rate`; strict-receive paths need `amount / rate`.
    pub fn with_path_rate(
        mut self,
        source: &AssetInfo,
        destination: &AssetInfo,
        rate: Decimal,
        hops: Vec<AssetInfo>,
    ) -> Self {
        self.path_rates
            .insert(pair_key(source, destination), PathRate { rate, hops });
        self
    }

    /// Add a liquidity pool.
    pub fn with_pool(mut self, id: &str, reserves: Vec<(AssetInfo, Decimal)>) -> Self {
        self.pools.push(LiquidityPool {
            id: id.to_string(),
            reserves: reserves
                .into_iter()
                .map(|(asset, amount)| PoolReserve { asset, amount })
                .collect(),
        });
        self
    }

    /// Add an account with balances and metadata (values stored as given, i.e. base64).
    pub fn with_account(
        mut self,
        id: &AccountId,
        balances: Vec<(AssetInfo, Decimal)>,
        data: Vec<(&str, &str)>,
    ) -> Self {
        let record = AccountRecord {
            id: id.clone(),
            balances: balances
                .into_iter()
                .map(|(asset, balance)| AccountBalance { asset, balance })
                .collect(),
            data: data
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        };
        self.accounts.insert(id.clone(), record);
        self
    }

    /// Make every call of `operation` fail with `error`.
    pub fn with_failure(mut self, operation: MockOperation, error: DataSourceError) -> Self {
        self.failures.insert(operation, error);
        self
    }

    /// Make fetching one account fail with `error`.
    pub fn with_account_failure(mut self, id: &AccountId, error: DataSourceError) -> Self {
        self.account_failures.insert(id.clone(), error);
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of calls made so far for `operation`.
    pub fn call_count(&self, operation: MockOperation) -> usize {
        self.calls
            .get(&operation)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Highest number of calls observed in flight at the same time.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: MockOperation) -> Result<(), DataSourceError> {
        if let Some(counter) = self.calls.get(&operation) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.failures.get(&operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerQuoteSource for MockLedger {
    async fn fetch_orderbook(
        &self,
        selling: &AssetInfo,
        buying: &AssetInfo,
        depth: u32,
    ) -> Result<Orderbook, DataSourceError> {
        self.enter(MockOperation::Orderbook).await?;
        let mut book = self
            .orderbooks
            .get(&pair_key(selling, buying))
            .cloned()
            .unwrap_or_default();
        book.bids.truncate(depth as usize);
        book.asks.truncate(depth as usize);
        Ok(book)
    }

    async fn fetch_strict_send_paths(
        &self,
        source: &AssetInfo,
        amount: Decimal,
        destination: &AssetInfo,
    ) -> Result<Vec<PaymentPath>, DataSourceError> {
        self.enter(MockOperation::StrictSendPaths).await?;
        Ok(self
            .path_rates
            .get(&pair_key(source, destination))
            .map(|p| PaymentPath {
                source_amount: amount,
                destination_amount: amount * p.rate,
                hops: p.hops.clone(),
            })
            .into_iter()
            .collect())
    }

    async fn fetch_strict_receive_paths(
        &self,
        source: &AssetInfo,
        destination: &AssetInfo,
        amount: Decimal,
    ) -> Result<Vec<PaymentPath>, DataSourceError> {
        self.enter(MockOperation::StrictReceivePaths).await?;
        Ok(self
            .path_rates
            .get(&pair_key(source, destination))
            .filter(|p| !p.rate.is_zero())
            .map(|p| PaymentPath {
                source_amount: amount.safe_div(p.rate),
                destination_amount: amount,
                hops: p.hops.clone(),
            })
            .into_iter()
            .collect())
    }

    async fn fetch_liquidity_pools(
        &self,
        reserve_a: &AssetInfo,
        reserve_b: &AssetInfo,
    ) -> Result<Vec<LiquidityPool>, DataSourceError> {
        self.enter(MockOperation::LiquidityPools).await?;
        Ok(self
            .pools
            .iter()
            .filter(|pool| {
                pool.reserves.iter().any(|r| &r.asset == reserve_a)
                    && pool.reserves.iter().any(|r| &r.asset == reserve_b)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerAccountSource for MockLedger {
    async fn fetch_account(&self, id: &AccountId) -> Result<AccountRecord, DataSourceError> {
        self.enter(MockOperation::Account).await?;
        if let Some(err) = self.account_failures.get(id) {
            return Err(err.clone());
        }
        self.accounts
            .get(id)
            .cloned()
            .ok_or_else(|| DataSourceError::NotFound(format!("account {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderbookLevel;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn fund() -> AssetInfo {
        AssetInfo::credit("FUND", "GISSUER").unwrap()
    }

    #[tokio::test]
    async fn test_mock_path_rate_scales_with_amount() {
        let mock = MockLedger::new().with_path_rate(&fund(), &AssetInfo::native(), dec("0.5"), vec![]);
        let paths = mock
            .fetch_strict_send_paths(&fund(), dec("10"), &AssetInfo::native())
            .await
            .unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].destination_amount, dec("5"));

        let paths = mock
            .fetch_strict_receive_paths(&fund(), &AssetInfo::native(), dec("5"))
            .await
            .unwrap();
        assert_eq!(paths[0].source_amount, dec("10"));
    }

    #[tokio::test]
    async fn test_mock_orderbook_truncated_to_depth() {
        let level = OrderbookLevel {
            price: dec("0.4"),
            amount: dec("1"),
        };
        let book = Orderbook {
            bids: vec![level.clone(), level.clone(), level],
            asks: vec![],
        };
        let mock = MockLedger::new().with_orderbook(&fund(), &AssetInfo::native(), book);
        let fetched = mock
            .fetch_orderbook(&fund(), &AssetInfo::native(), 2)
            .await
            .unwrap();
        assert_eq!(fetched.bids.len(), 2);
        assert_eq!(mock.call_count(MockOperation::Orderbook), 1);
    }

    #[tokio::test]
    async fn test_mock_injected_failure() {
        let mock = MockLedger::new().with_failure(MockOperation::LiquidityPools, DataSourceError::RateLimited);
        let result = mock
            .fetch_liquidity_pools(&fund(), &AssetInfo::native())
            .await;
        assert_eq!(result, Err(DataSourceError::RateLimited));
    }

    #[tokio::test]
    async fn test_mock_unknown_account_is_not_found() {
        let mock = MockLedger::new();
        let result = mock.fetch_account(&AccountId::new("GNONE")).await;
        assert!(matches!(result, Err(DataSourceError::NotFound(_))));
    }
}
