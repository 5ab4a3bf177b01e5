//! Read-only data source abstractions: ledger markets, ledger accounts,
//! external quotes and historical indicator values.

use crate::domain::{
    AccountBalance, AccountId, AssetInfo, Decimal, ExternalSymbol, IndicatorId, LiquidityPool,
    Orderbook, PaymentPath,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod horizon;
pub mod mock;
pub mod quotes;

pub use horizon::HorizonClient;
pub use mock::MockLedger;
pub use quotes::{StaticHistory, StaticQuoteStore};

/// Market queries against the public ledger.
///
/// Implementations handle retry/backoff, rate limiting and pagination; callers
/// only observe success, failure or cancellation (by dropping the future).
#[async_trait]
pub trait LedgerQuoteSource: Send + Sync + fmt::Debug {
    /// Order book for offers selling `selling` in exchange for `buying`.
    async fn fetch_orderbook(
        &self,
        selling: &AssetInfo,
        buying: &AssetInfo,
        depth: u32,
    ) -> Result<Orderbook, DataSourceError>;

    /// Paths delivering as much `destination` as possible for exactly `amount` of `source`.
    async fn fetch_strict_send_paths(
        &self,
        source: &AssetInfo,
        amount: Decimal,
        destination: &AssetInfo,
    ) -> Result<Vec<PaymentPath>, DataSourceError>;

    /// Paths delivering exactly `amount` of `destination` for as little `source` as possible.
    async fn fetch_strict_receive_paths(
        &self,
        source: &AssetInfo,
        destination: &AssetInfo,
        amount: Decimal,
    ) -> Result<Vec<PaymentPath>, DataSourceError>;

    /// Liquidity pools holding both reserves.
    async fn fetch_liquidity_pools(
        &self,
        reserve_a: &AssetInfo,
        reserve_b: &AssetInfo,
    ) -> Result<Vec<LiquidityPool>, DataSourceError>;
}

/// Ledger account state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: AccountId,
    pub balances: Vec<AccountBalance>,
    /// Metadata entries; values are base64 encoded as stored on the ledger.
    pub data: BTreeMap<String, String>,
}

impl AccountRecord {
    /// Balance held of `asset`, zero if the account has no trustline for it.
    pub fn balance_of(&self, asset: &AssetInfo) -> Decimal {
        self.balances
            .iter()
            .filter(|b| &b.asset == asset)
            .map(|b| b.balance)
            .sum()
    }
}

#[async_trait]
pub trait LedgerAccountSource: Send + Sync + fmt::Debug {
    async fn fetch_account(&self, id: &AccountId) -> Result<AccountRecord, DataSourceError>;
}

/// Periodically refreshed external price feed.
#[async_trait]
pub trait ExternalQuoteStore: Send + Sync + fmt::Debug {
    /// Price of one unit of `symbol` in the fund's reference currency
    /// (metals are quoted per troy ounce).
    async fn get_quote(&self, symbol: ExternalSymbol) -> Result<Decimal, DataSourceError>;
}

/// Previously computed indicator values.
#[async_trait]
pub trait HistoricalIndicatorAccessor: Send + Sync + fmt::Debug {
    /// Value of `id` as last recorded at or before `at`, `None` if never recorded.
    async fn indicator_value_at(
        &self,
        id: IndicatorId,
        at: DateTime<Utc>,
    ) -> Result<Option<Decimal>, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    #[error("Network error: {0}")]
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    #[error("Rate limited")]
    RateLimited,
    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_datasource_error_display() {
        let err = DataSourceError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = DataSourceError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = DataSourceError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");

        let err = DataSourceError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited");

        let err = DataSourceError::NotFound("account GABC".to_string());
        assert_eq!(err.to_string(), "Not found: account GABC");
    }

    #[test]
    fn test_account_record_balance_of() {
        let fund = AssetInfo::credit("FUND", "GISSUER").unwrap();
        let record = AccountRecord {
            id: AccountId::new("GACC"),
            balances: vec![AccountBalance {
                asset: fund.clone(),
                balance: Decimal::from_str("42").unwrap(),
            }],
            data: BTreeMap::new(),
        };
        assert_eq!(record.balance_of(&fund), Decimal::from_str("42").unwrap());
        assert_eq!(record.balance_of(&AssetInfo::native()), Decimal::zero());
    }
}
