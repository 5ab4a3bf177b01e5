//! Horizon-style ledger REST client.

use super::{AccountRecord, DataSourceError, LedgerAccountSource, LedgerQuoteSource};
use crate::domain::{
    AccountBalance, AccountId, AssetInfo, Decimal, LiquidityPool, Orderbook, OrderbookLevel,
    PaymentPath, PoolReserve,
};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const PAGE_LIMIT: &str = "200";

/// Ledger data source using the public Horizon API.
#[derive(Debug, Clone)]
pub struct HorizonClient {
    client: Client,
    base_url: String,
}

impl HorizonClient {
    /// Create a new Horizon client.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create with the default public network URL.
    pub fn default_url() -> Self {
        Self::new("https://horizon.stellar.org".to_string())
    }

    async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(url = %url, "Rate limited by ledger API, backing off");
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status == StatusCode::NOT_FOUND {
                return Err(backoff::Error::permanent(DataSourceError::NotFound(
                    path.to_string(),
                )));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }

    async fn fetch_paths(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Vec<PaymentPath>, DataSourceError> {
        let response = self.get_json(path, &query).await?;
        let mut paths = Vec::new();
        for record in embedded_records(&response)? {
            match parse_path(record) {
                Ok(p) => paths.push(p),
                Err(e) => warn!("Failed to parse path record: {}", e),
            }
        }
        Ok(paths)
    }
}

#[async_trait]
impl LedgerQuoteSource for HorizonClient {
    async fn fetch_orderbook(
        &self,
        selling: &AssetInfo,
        buying: &AssetInfo,
        depth: u32,
    ) -> Result<Orderbook, DataSourceError> {
        debug!(selling = %selling, buying = %buying, depth, "Fetching order book");
        let mut query = asset_query("selling", selling);
        query.extend(asset_query("buying", buying));
        query.push(("limit".to_string(), depth.to_string()));

        let response = self.get_json("/order_book", &query).await?;
        parse_orderbook(&response)
    }

    async fn fetch_strict_send_paths(
        &self,
        source: &AssetInfo,
        amount: Decimal,
        destination: &AssetInfo,
    ) -> Result<Vec<PaymentPath>, DataSourceError> {
        debug!(source = %source, destination = %destination, amount = %amount, "Fetching strict-send paths");
        let mut query = asset_query("source", source);
        query.push(("source_amount".to_string(), amount.to_canonical_string()));
        query.push(("destination_assets".to_string(), destination.canonical()));
        self.fetch_paths("/paths/strict-send", query).await
    }

    async fn fetch_strict_receive_paths(
        &self,
        source: &AssetInfo,
        destination: &AssetInfo,
        amount: Decimal,
    ) -> Result<Vec<PaymentPath>, DataSourceError> {
        debug!(source = %source, destination = %destination, amount = %amount, "Fetching strict-receive paths");
        let mut query = asset_query("destination", destination);
        query.push(("destination_amount".to_string(), amount.to_canonical_string()));
        query.push(("source_assets".to_string(), source.canonical()));
        self.fetch_paths("/paths/strict-receive", query).await
    }

    async fn fetch_liquidity_pools(
        &self,
        reserve_a: &AssetInfo,
        reserve_b: &AssetInfo,
    ) -> Result<Vec<LiquidityPool>, DataSourceError> {
        debug!(reserve_a = %reserve_a, reserve_b = %reserve_b, "Fetching liquidity pools");
        let query = vec![
            (
                "reserves".to_string(),
                format!("{},{}", reserve_a.canonical(), reserve_b.canonical()),
            ),
            ("limit".to_string(), PAGE_LIMIT.to_string()),
        ];
        let response = self.get_json("/liquidity_pools", &query).await?;

        let mut pools = Vec::new();
        for record in embedded_records(&response)? {
            match parse_pool(record) {
                Ok(pool) => pools.push(pool),
                Err(e) => warn!("Failed to parse liquidity pool: {}", e),
            }
        }
        Ok(pools)
    }
}

#[async_trait]
impl LedgerAccountSource for HorizonClient {
    async fn fetch_account(&self, id: &AccountId) -> Result<AccountRecord, DataSourceError> {
        debug!(account = %id, "Fetching account");
        let response = self
            .get_json(&format!("/accounts/{}", id.as_str()), &[])
            .await?;
        parse_account(&response)
    }
}

fn asset_query(prefix: &str, asset: &AssetInfo) -> Vec<(String, String)> {
    let mut query = vec![(
        format!("{}_asset_type", prefix),
        asset.kind().as_str().to_string(),
    )];
    if let Some(issuer) = asset.issuer() {
        query.push((format!("{}_asset_code", prefix), asset.code().to_string()));
        query.push((format!("{}_asset_issuer", prefix), issuer.to_string()));
    }
    query
}

fn embedded_records(response: &Value) -> Result<&Vec<Value>, DataSourceError> {
    response
        .get("_embedded")
        .and_then(|e| e.get("records"))
        .and_then(|r| r.as_array())
        .ok_or_else(|| DataSourceError::ParseError("Missing _embedded.records".to_string()))
}

fn decimal_field(json: &Value, field: &str) -> Result<Decimal, DataSourceError> {
    let raw = json
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError(format!("Missing {} field", field)))?;
    Decimal::from_str_canonical(raw)
        .map_err(|e| DataSourceError::ParseError(format!("Invalid {}: {}", field, e)))
}

/// Parse an asset in object form (`asset_type`, `asset_code`, `asset_issuer`).
fn parse_asset_object(json: &Value) -> Result<AssetInfo, DataSourceError> {
    let asset_type = json
        .get("asset_type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError("Missing asset_type field".to_string()))?;
    if asset_type == "native" {
        return Ok(AssetInfo::native());
    }
    let code = json
        .get("asset_code")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError("Missing asset_code field".to_string()))?;
    let issuer = json
        .get("asset_issuer")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError("Missing asset_issuer field".to_string()))?;
    AssetInfo::credit(code, issuer).map_err(|e| DataSourceError::ParseError(e.to_string()))
}

fn parse_levels(json: &Value, field: &str) -> Result<Vec<OrderbookLevel>, DataSourceError> {
    let levels = json
        .get(field)
        .and_then(|v| v.as_array())
        .ok_or_else(|| DataSourceError::ParseError(format!("Missing {} field", field)))?;
    levels
        .iter()
        .map(|level| {
            Ok(OrderbookLevel {
                price: decimal_field(level, "price")?,
                amount: decimal_field(level, "amount")?,
            })
        })
        .collect()
}

fn parse_orderbook(json: &Value) -> Result<Orderbook, DataSourceError> {
    Ok(Orderbook {
        bids: parse_levels(json, "bids")?,
        asks: parse_levels(json, "asks")?,
    })
}

fn parse_path(json: &Value) -> Result<PaymentPath, DataSourceError> {
    let hops = json
        .get("path")
        .and_then(|v| v.as_array())
        .map(|hops| hops.iter().map(parse_asset_object).collect::<Result<Vec<_>, _>>())
        .transpose()?
        .unwrap_or_default();
    Ok(PaymentPath {
        source_amount: decimal_field(json, "source_amount")?,
        destination_amount: decimal_field(json, "destination_amount")?,
        hops,
    })
}

fn parse_pool(json: &Value) -> Result<LiquidityPool, DataSourceError> {
    let id = json
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError("Missing id field".to_string()))?
        .to_string();
    let reserves = json
        .get("reserves")
        .and_then(|v| v.as_array())
        .ok_or_else(|| DataSourceError::ParseError("Missing reserves field".to_string()))?
        .iter()
        .map(|reserve| {
            let asset = reserve
                .get("asset")
                .and_then(|v| v.as_str())
                .ok_or_else(|| DataSourceError::ParseError("Missing asset field".to_string()))?
                .parse::<AssetInfo>()
                .map_err(|e| DataSourceError::ParseError(e.to_string()))?;
            Ok(PoolReserve {
                asset,
                amount: decimal_field(reserve, "amount")?,
            })
        })
        .collect::<Result<Vec<_>, DataSourceError>>()?;
    Ok(LiquidityPool { id, reserves })
}

fn parse_account(json: &Value) -> Result<AccountRecord, DataSourceError> {
    let id = json
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError("Missing id field".to_string()))?;

    let mut balances = Vec::new();
    if let Some(lines) = json.get("balances").and_then(|v| v.as_array()) {
        for line in lines {
            // Pool share balances carry no asset code and are not holdings.
            if line.get("asset_type").and_then(|v| v.as_str()) == Some("liquidity_pool_shares") {
                continue;
            }
            match (parse_asset_object(line), decimal_field(line, "balance")) {
                (Ok(asset), Ok(balance)) => balances.push(AccountBalance { asset, balance }),
                (Err(e), _) | (_, Err(e)) => warn!(account = %id, "Failed to parse balance: {}", e),
            }
        }
    }

    let data = json
        .get("data")
        .and_then(|v| v.as_object())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    Ok(AccountRecord {
        id: AccountId::new(id),
        balances,
        data,
    })
}
