//! Point-in-time fund structure handed to the indicator engine.

use super::{AccountId, AssetInfo, Decimal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a holding was priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingSource {
    /// Discovered from ledger markets.
    Market,
    /// Overridden by a manual valuation.
    ManualValuation,
    /// No source produced a price; values are zero.
    Unpriced,
}

/// A priced balance of one asset in one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub asset: AssetInfo,
    pub balance: Decimal,
    pub price_primary: Decimal,
    pub price_secondary: Decimal,
    pub value_primary: Decimal,
    pub value_secondary: Decimal,
    pub pricing: PricingSource,
}

/// A fund account and its priced holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHoldings {
    pub account: AccountId,
    pub label: String,
    pub holdings: Vec<Holding>,
}

/// Dividend paid to shareholders, in the primary reference currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendDistribution {
    pub paid_at: DateTime<Utc>,
    pub amount: Decimal,
}

/// Balance of a share token held by a (non-fund) account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderBalance {
    pub account: AccountId,
    pub asset: AssetInfo,
    pub balance: Decimal,
}

/// Priced snapshot of a fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundSnapshot {
    pub taken_at: DateTime<Utc>,
    /// Token representing one fund share.
    pub fund_token: AssetInfo,
    /// Second share class counted in tokenomics participation.
    pub companion_token: Option<AssetInfo>,
    pub issuer: AccountId,
    pub primary_reference: AssetInfo,
    pub secondary_reference: AssetInfo,
    /// Issued amount of the fund token.
    pub share_supply: Decimal,
    /// Price of one share in the primary reference currency.
    pub share_price: Decimal,
    pub accounts: Vec<AccountHoldings>,
    pub dividends: Vec<DividendDistribution>,
    pub holders: Vec<HolderBalance>,
}

impl FundSnapshot {
    /// Holdings that count as fund assets (the fund's own shares excluded).
    pub fn asset_holdings(&self) -> impl Iterator<Item = &Holding> + '_ {
        self.accounts
            .iter()
            .flat_map(|a| a.holdings.iter())
            .filter(move |h| h.asset != self.fund_token)
    }
}
