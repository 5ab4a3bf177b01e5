//! Domain primitives: AccountId, IndicatorId.

use serde::{Deserialize, Serialize};

/// Public ledger account identifier (e.g. a `G...` public key).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Create an AccountId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    /// Get the account id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable, globally unique key of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorId(pub u32);

impl IndicatorId {
    pub const fn new(id: u32) -> Self {
        IndicatorId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_display() {
        let account = AccountId::new("GABC");
        assert_eq!(account.to_string(), "GABC");
    }

    #[test]
    fn test_account_id_ordering_is_lexicographic() {
        let a = AccountId::new("GAAA");
        let b = AccountId::new("GBBB");
        assert!(a < b);
    }

    #[test]
    fn test_indicator_id_serializes_as_number() {
        let json = serde_json::to_string(&IndicatorId::new(301)).unwrap();
        assert_eq!(json, "301");
    }
}
