//! Ledger asset identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const NATIVE_CODE: &str = "XLM";
const NATIVE_CANONICAL: &str = "native";

/// Ledger representation of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// The ledger's native currency.
    Native,
    /// Issued asset with a code of at most 4 characters.
    CreditAlphanum4,
    /// Issued asset with a code of 5 to 12 characters.
    CreditAlphanum12,
}

impl AssetKind {
    /// Wire name used by the ledger API.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Native => "native",
            AssetKind::CreditAlphanum4 => "credit_alphanum4",
            AssetKind::CreditAlphanum12 => "credit_alphanum12",
        }
    }
}

/// Immutable asset identity. Equality is structural.
///
/// `kind` is derived from `code` on construction, so two assets with the same
/// code and issuer always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetInfo {
    code: String,
    issuer: Option<String>,
    kind: AssetKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetParseError {
    #[error("asset must be \"native\" or CODE:ISSUER, got {0:?}")]
    Malformed(String),
    #[error("asset code must be 1 to 12 characters, got {0:?}")]
    InvalidCode(String),
}

impl AssetInfo {
    /// The ledger's native currency.
    pub fn native() -> Self {
        AssetInfo {
            code: NATIVE_CODE.to_string(),
            issuer: None,
            kind: AssetKind::Native,
        }
    }

    /// An issued asset.
    pub fn credit(code: impl Into<String>, issuer: impl Into<String>) -> Result<Self, AssetParseError> {
        let code = code.into();
        if code.is_empty() || code.len() > 12 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AssetParseError::InvalidCode(code));
        }
        let kind = if code.len() <= 4 {
            AssetKind::CreditAlphanum4
        } else {
            AssetKind::CreditAlphanum12
        };
        Ok(AssetInfo {
            code,
            issuer: Some(issuer.into()),
            kind,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn is_native(&self) -> bool {
        self.kind == AssetKind::Native
    }

    /// `"native"` or `"CODE:ISSUER"`; used as map and cache key.
    pub fn canonical(&self) -> String {
        match &self.issuer {
            None => NATIVE_CANONICAL.to_string(),
            Some(issuer) => format!("{}:{}", self.code, issuer),
        }
    }
}

impl fmt::Display for AssetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl FromStr for AssetInfo {
    type Err = AssetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NATIVE_CANONICAL) {
            return Ok(AssetInfo::native());
        }
        match s.split_once(':') {
            Some((code, issuer)) if !issuer.is_empty() && !issuer.contains(':') => {
                AssetInfo::credit(code, issuer)
            }
            _ => Err(AssetParseError::Malformed(s.to_string())),
        }
    }
}

impl TryFrom<String> for AssetInfo {
    type Error = AssetParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetInfo> for String {
    fn from(value: AssetInfo) -> Self {
        value.canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUER: &str = "GISSUER";

    #[test]
    fn test_kind_derived_from_code_length() {
        assert_eq!(
            AssetInfo::credit("USDC", ISSUER).unwrap().kind(),
            AssetKind::CreditAlphanum4
        );
        assert_eq!(
            AssetInfo::credit("FUNDSHARE", ISSUER).unwrap().kind(),
            AssetKind::CreditAlphanum12
        );
        assert_eq!(AssetInfo::native().kind(), AssetKind::Native);
    }

    #[test]
    fn test_canonical_form() {
        assert_eq!(AssetInfo::native().canonical(), "native");
        assert_eq!(
            AssetInfo::credit("BRL", ISSUER).unwrap().canonical(),
            "BRL:GISSUER"
        );
    }

    #[test]
    fn test_parse_canonical() {
        let asset: AssetInfo = "BRL:GISSUER".parse().unwrap();
        assert_eq!(asset, AssetInfo::credit("BRL", ISSUER).unwrap());
        assert_eq!("native".parse::<AssetInfo>().unwrap(), AssetInfo::native());
        assert!("BRL".parse::<AssetInfo>().is_err());
        assert!("WAYTOOLONGCODE1:G".parse::<AssetInfo>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let asset = AssetInfo::credit("BRL", ISSUER).unwrap();
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, "\"BRL:GISSUER\"");
        let back: AssetInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, asset);
    }
}
