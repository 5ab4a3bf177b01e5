//! Manual valuation overrides: scanning account metadata, parsing, lookup and
//! conversion into the reference currency.

use crate::datasource::DataSourceError;
use crate::domain::ExternalSymbol;
use thiserror::Error;

pub mod lookup;
pub mod parse;
pub mod resolver;
pub mod scanner;

pub use lookup::lookup_valuation;
pub use parse::{normalize_locale, parse_value};
pub use resolver::ValuationResolver;
pub use scanner::{deduplicate_valuations, extract_valuations, ValuationScanner, SCAN_CONCURRENCY};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuationError {
    #[error("Unparseable valuation {raw:?}: {reason}")]
    Parse { raw: String, reason: String },
    #[error("Quote for {symbol} unavailable: {source}")]
    QuoteUnavailable {
        symbol: ExternalSymbol,
        source: DataSourceError,
    },
    #[error("All {0} valuation accounts failed")]
    AllAccountsFailed(usize),
    #[error("Valuation cancelled")]
    Cancelled,
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}
