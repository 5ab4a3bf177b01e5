//! Manually recorded valuation overrides.

use super::{AccountId, Decimal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a valuation describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuationKind {
    /// Total value of a one-indivisible-unit holding.
    Nft,
    /// Price per unit.
    Unit,
}

impl fmt::Display for ValuationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuationKind::Nft => write!(f, "nft"),
            ValuationKind::Unit => write!(f, "unit"),
        }
    }
}

/// Symbols quoted by the external price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExternalSymbol {
    /// Gold.
    #[serde(rename = "AU")]
    Au,
    /// Silver.
    #[serde(rename = "AG")]
    Ag,
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

impl ExternalSymbol {
    pub const ALL: [ExternalSymbol; 6] = [
        ExternalSymbol::Au,
        ExternalSymbol::Ag,
        ExternalSymbol::Btc,
        ExternalSymbol::Eth,
        ExternalSymbol::Usd,
        ExternalSymbol::Eur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalSymbol::Au => "AU",
            ExternalSymbol::Ag => "AG",
            ExternalSymbol::Btc => "BTC",
            ExternalSymbol::Eth => "ETH",
            ExternalSymbol::Usd => "USD",
            ExternalSymbol::Eur => "EUR",
        }
    }
}

impl fmt::Display for ExternalSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExternalSymbol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExternalSymbol::ALL
            .into_iter()
            .find(|symbol| symbol.as_str() == s)
            .ok_or(())
    }
}

/// Mass unit attached to a quantity of an external symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MassUnit {
    /// Grams.
    G,
    /// Troy ounces.
    Oz,
}

impl MassUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MassUnit::G => "g",
            MassUnit::Oz => "oz",
        }
    }
}

/// Decoded value of a valuation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValuationValue {
    /// Amount already expressed in the fund's reference currency.
    ReferenceCurrency { amount: Decimal },
    /// Amount expressed as a quantity of an externally quoted symbol.
    ExternalQuote {
        symbol: ExternalSymbol,
        quantity: Option<Decimal>,
        unit: Option<MassUnit>,
    },
}

/// A manual valuation read from account metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValuation {
    pub token_code: String,
    pub kind: ValuationKind,
    pub raw_value: ValuationValue,
    pub source_account: AccountId,
}

/// A valuation converted into the reference currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAssetValuation {
    pub valuation: AssetValuation,
    pub value_in_reference_currency: Decimal,
}
