//! Concurrent scan of the valuation account registry.

use super::{parse_value, ValuationError};
use crate::config::ValuationAccountRegistry;
use crate::datasource::{AccountRecord, LedgerAccountSource};
use crate::domain::{AssetValuation, ValuationKind};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Concurrent account fetches allowed during one scan.
pub const SCAN_CONCURRENCY: usize = 3;

const NFT_SUFFIX: &str = "_nft_value";
const UNIT_SUFFIX: &str = "_unit_value";

#[derive(Debug, Clone)]
pub struct ValuationScanner {
    accounts: Arc<dyn LedgerAccountSource>,
    registry: Arc<ValuationAccountRegistry>,
}

impl ValuationScanner {
    pub fn new(accounts: Arc<dyn LedgerAccountSource>, registry: Arc<ValuationAccountRegistry>) -> Self {
        Self { accounts, registry }
    }

    /// Read every valuation entry of the registry accounts.
    ///
    /// A failing account is skipped; the scan only fails if every account failed.
    /// The result is deduplicated and independent of fetch completion order.
    pub async fn fetch_all_valuations(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<AssetValuation>, ValuationError> {
        let total = self.registry.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(SCAN_CONCURRENCY));
        let mut tasks = JoinSet::new();

        for account in self.registry.accounts() {
            let account = account.clone();
            let source = self.accounts.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return (account, Err(ValuationError::Cancelled)),
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return (account, Err(ValuationError::Cancelled)),
                    },
                };
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ValuationError::Cancelled),
                    record = source.fetch_account(&account) => record.map_err(ValuationError::from),
                };
                (account, result)
            });
        }

        let mut valuations = Vec::new();
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let (account, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Valuation scan task failed: {}", e);
                    failed += 1;
                    continue;
                }
            };
            match result {
                Ok(record) => {
                    let found = extract_valuations(&record);
                    debug!(account = %account, count = found.len(), "Scanned valuation account");
                    valuations.extend(found);
                }
                Err(ValuationError::Cancelled) => {
                    tasks.abort_all();
                    return Err(ValuationError::Cancelled);
                }
                Err(e) => {
                    warn!(account = %account, "Skipping valuation account: {}", e);
                    failed += 1;
                }
            }
        }

        if failed == total {
            return Err(ValuationError::AllAccountsFailed(total));
        }

        let valuations = deduplicate_valuations(valuations);
        info!(
            accounts = total,
            failed,
            valuations = valuations.len(),
            "Valuation scan complete"
        );
        Ok(valuations)
    }
}

/// Valuation entries of one account; malformed entries are skipped.
pub fn extract_valuations(record: &AccountRecord) -> Vec<AssetValuation> {
    let mut valuations = Vec::new();
    for (key, encoded) in &record.data {
        let Some((token_code, kind)) = split_key(key) else {
            continue;
        };

        let decoded = match STANDARD
            .decode(encoded.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            Some(decoded) => decoded,
            None => {
                warn!(account = %record.id, key = %key, "Valuation entry is not base64 text");
                continue;
            }
        };

        match parse_value(&decoded) {
            Ok(raw_value) => valuations.push(AssetValuation {
                token_code: token_code.to_string(),
                kind,
                raw_value,
                source_account: record.id.clone(),
            }),
            Err(e) => warn!(account = %record.id, key = %key, "Skipping valuation entry: {}", e),
        }
    }
    valuations
}

fn split_key(key: &str) -> Option<(&str, ValuationKind)> {
    let (code, kind) = if let Some(code) = key.strip_suffix(NFT_SUFFIX) {
        (code, ValuationKind::Nft)
    } else if let Some(code) = key.strip_suffix(UNIT_SUFFIX) {
        (code, ValuationKind::Unit)
    } else {
        return None;
    };
    if code.is_empty() {
        None
    } else {
        Some((code, kind))
    }
}

/// Keep one valuation per (token code, kind): the one from the lexicographically
/// smallest source account.
pub fn deduplicate_valuations(mut valuations: Vec<AssetValuation>) -> Vec<AssetValuation> {
    valuations.sort_by(|a, b| {
        a.source_account
            .cmp(&b.source_account)
            .then_with(|| a.token_code.cmp(&b.token_code))
            .then_with(|| a.kind.cmp(&b.kind))
    });

    let mut seen: HashSet<(String, ValuationKind)> = HashSet::new();
    valuations
        .into_iter()
        .filter(|v| seen.insert((v.token_code.clone(), v.kind)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::mock::MockLedger;
    use crate::datasource::DataSourceError;
    use crate::domain::{AccountId, Decimal, ValuationValue};
    use std::str::FromStr;
    use std::time::Duration;

    fn b64(s: &str) -> String {
        STANDARD.encode(s)
    }

    fn make_test_valuation(code: &str, kind: ValuationKind, account: &str, amount: &str) -> AssetValuation {
        AssetValuation {
            token_code: code.to_string(),
            kind,
            raw_value: ValuationValue::ReferenceCurrency {
                amount: Decimal::from_str(amount).unwrap(),
            },
            source_account: AccountId::new(account),
        }
    }

    #[test]
    fn test_split_key_suffixes() {
        assert_eq!(split_key("GOLD_nft_value"), Some(("GOLD", ValuationKind::Nft)));
        assert_eq!(split_key("GOLD_unit_value"), Some(("GOLD", ValuationKind::Unit)));
        assert_eq!(split_key("_unit_value"), None);
        assert_eq!(split_key("config"), None);
    }

    #[test]
    fn test_extract_skips_malformed_entries() {
        let record = AccountRecord {
            id: AccountId::new("GACC"),
            balances: vec![],
            data: [
                ("GOLD_unit_value".to_string(), b64("10,5")),
                ("SILV_unit_value".to_string(), b64("not a value")),
                ("BOND_nft_value".to_string(), "%%%".to_string()),
                ("home_domain".to_string(), b64("example.org")),
            ]
            .into_iter()
            .collect(),
        };
        let found = extract_valuations(&record);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].token_code, "GOLD");
        assert_eq!(
            found[0].raw_value,
            ValuationValue::ReferenceCurrency {
                amount: Decimal::from_str("10.5").unwrap()
            }
        );
    }

    #[test]
    fn test_dedup_independent_of_input_order() {
        let a = make_test_valuation("GOLD", ValuationKind::Unit, "GB", "2");
        let b = make_test_valuation("GOLD", ValuationKind::Unit, "GA", "1");
        let c = make_test_valuation("GOLD", ValuationKind::Nft, "GC", "3");

        let forward = deduplicate_valuations(vec![a.clone(), b.clone(), c.clone()]);
        let backward = deduplicate_valuations(vec![c, b.clone(), a]);
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 2);
        assert!(forward.contains(&b));
    }

    #[tokio::test]
    async fn test_scan_bounded_and_tolerates_single_failure() {
        let ids: Vec<AccountId> = (0..8).map(|i| AccountId::new(format!("G{}", i))).collect();
        let mut mock = MockLedger::new().with_latency(Duration::from_millis(20));
        for id in &ids {
            mock = mock.with_account(id, vec![], vec![("GOLD_unit_value", "MTA=")]);
        }
        mock = mock.with_account_failure(&ids[0], DataSourceError::RateLimited);
        let mock = Arc::new(mock);

        let scanner = ValuationScanner::new(mock.clone(), Arc::new(ValuationAccountRegistry::new(ids)));
        let valuations = scanner
            .fetch_all_valuations(&CancellationToken::new())
            .await
            .unwrap();

        assert!(mock.max_concurrent_calls() <= SCAN_CONCURRENCY);
        assert_eq!(valuations.len(), 1);
        assert_eq!(valuations[0].source_account, AccountId::new("G1"));
    }

    #[tokio::test]
    async fn test_scan_fails_when_every_account_fails() {
        let ids = vec![AccountId::new("GA"), AccountId::new("GB")];
        let scanner = ValuationScanner::new(
            Arc::new(MockLedger::new()),
            Arc::new(ValuationAccountRegistry::new(ids)),
        );
        let result = scanner.fetch_all_valuations(&CancellationToken::new()).await;
        assert_eq!(result, Err(ValuationError::AllAccountsFailed(2)));
    }

    #[tokio::test]
    async fn test_scan_cancelled() {
        let ids = vec![AccountId::new("GA")];
        let mock = MockLedger::new()
            .with_account(&ids[0], vec![], vec![])
            .with_latency(Duration::from_secs(30));
        let scanner = ValuationScanner::new(Arc::new(mock), Arc::new(ValuationAccountRegistry::new(ids)));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = scanner.fetch_all_valuations(&cancel).await;
        assert_eq!(result, Err(ValuationError::Cancelled));
    }
}
