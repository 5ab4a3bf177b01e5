use crate::domain::{AccountId, AssetInfo, Decimal, ExternalSymbol};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_LEDGER_API_URL: &str = "https://horizon.stellar.org";
pub const DEFAULT_ORDERBOOK_DEPTH: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub ledger_api_url: String,
    pub reference_assets: ReferenceAssets,
    pub valuation_accounts: Arc<ValuationAccountRegistry>,
    pub orderbook_depth: u32,
    pub fund_structure_path: Option<String>,
    /// Startup prices for the external quote store, in the primary reference.
    pub external_quotes: BTreeMap<ExternalSymbol, Decimal>,
}

/// The two currencies every holding is priced against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAssets {
    pub primary: AssetInfo,
    pub secondary: AssetInfo,
}

/// Accounts scanned for manual valuation entries. Fixed at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuationAccountRegistry {
    accounts: Vec<AccountId>,
}

impl ValuationAccountRegistry {
    pub fn new(accounts: Vec<AccountId>) -> Self {
        let mut accounts = accounts;
        accounts.sort();
        accounts.dedup();
        Self { accounts }
    }

    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let ledger_api_url = env_map
            .get("LEDGER_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LEDGER_API_URL.to_string());

        let primary = env_map
            .get("PRIMARY_REFERENCE_ASSET")
            .ok_or_else(|| ConfigError::MissingEnv("PRIMARY_REFERENCE_ASSET".to_string()))?;
        let primary = parse_asset("PRIMARY_REFERENCE_ASSET", primary)?;

        let secondary = parse_asset(
            "SECONDARY_REFERENCE_ASSET",
            env_map
                .get("SECONDARY_REFERENCE_ASSET")
                .map(|s| s.as_str())
                .unwrap_or("native"),
        )?;

        if primary == secondary {
            return Err(ConfigError::InvalidValue(
                "SECONDARY_REFERENCE_ASSET".to_string(),
                "must differ from PRIMARY_REFERENCE_ASSET".to_string(),
            ));
        }

        let orderbook_depth = env_map
            .get("ORDERBOOK_DEPTH")
            .map(|s| s.as_str())
            .unwrap_or("20")
            .parse::<u32>()
            .ok()
            .filter(|depth| *depth > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "ORDERBOOK_DEPTH".to_string(),
                    "must be a positive u32".to_string(),
                )
            })?;

        let valuation_accounts = parse_valuation_accounts_from_map(&env_map)?;
        let external_quotes = match env_map.get("EXTERNAL_QUOTES") {
            Some(raw) => parse_external_quotes(raw)?,
            None => BTreeMap::new(),
        };

        Ok(Config {
            ledger_api_url,
            reference_assets: ReferenceAssets { primary, secondary },
            valuation_accounts: Arc::new(ValuationAccountRegistry::new(valuation_accounts)),
            orderbook_depth,
            fund_structure_path: env_map.get("FUND_STRUCTURE_PATH").cloned(),
            external_quotes,
        })
    }
}

fn parse_asset(key: &str, value: &str) -> Result<AssetInfo, ConfigError> {
    value
        .trim()
        .parse::<AssetInfo>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

/// `SYMBOL=PRICE` pairs separated by commas, e.g. `AU=10500.25,AG=130`.
fn parse_external_quotes(raw: &str) -> Result<BTreeMap<ExternalSymbol, Decimal>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue("EXTERNAL_QUOTES".to_string(), reason);
    let mut quotes = BTreeMap::new();
    for pair in raw.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let (symbol, price) = pair
            .split_once('=')
            .ok_or_else(|| invalid(format!("expected SYMBOL=PRICE, got {}", pair)))?;
        let symbol = symbol
            .trim()
            .to_uppercase()
            .parse::<ExternalSymbol>()
            .map_err(|_| invalid(format!("unknown symbol {}", symbol.trim())))?;
        let price = Decimal::from_str_canonical(price.trim())
            .ok()
            .filter(|p| p.is_positive())
            .ok_or_else(|| invalid(format!("price for {} must be a positive decimal", symbol)))?;
        quotes.insert(symbol, price);
    }
    Ok(quotes)
}

fn parse_valuation_accounts_from_map(
    env_map: &HashMap<String, String>,
) -> Result<Vec<AccountId>, ConfigError> {
    if let Some(accounts_str) = env_map.get("VALUATION_ACCOUNTS") {
        Ok(accounts_str
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(AccountId::new)
            .collect())
    } else if let Some(file_path) = env_map.get("VALUATION_ACCOUNTS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "VALUATION_ACCOUNTS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        Ok(content
            .lines()
            .map(|line| line.trim())
            .filter(|s| !s.is_empty() && !s.starts_with('#'))
            .map(AccountId::new)
            .collect())
    } else {
        Ok(Vec::new())
    }
}
