//! Selection of the valuation that overrides a holding's market price.

use crate::domain::{AccountId, AssetValuation, Decimal, ValuationKind};

/// Find the valuation overriding the market price of a holding, if any.
///
/// A balance of exactly one ledger unit is an indivisible (NFT-like) holding
/// and prefers a total-value entry over a per-unit one; any other balance
/// prefers per-unit. Within a kind, an entry from `owner` beats other accounts.
pub fn lookup_valuation<'a>(
    token_code: &str,
    balance: Decimal,
    owner: &AccountId,
    valuations: &'a [AssetValuation],
) -> Option<&'a AssetValuation> {
    let preference = if balance == Decimal::LEDGER_UNIT {
        [ValuationKind::Nft, ValuationKind::Unit]
    } else {
        [ValuationKind::Unit, ValuationKind::Nft]
    };

    preference.into_iter().find_map(|kind| {
        let mut candidates = valuations
            .iter()
            .filter(|v| v.token_code == token_code && v.kind == kind);
        let first = candidates.next()?;
        if &first.source_account == owner {
            return Some(first);
        }
        candidates
            .find(|v| &v.source_account == owner)
            .or(Some(first))
    })
}
