pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod pricing;
pub mod valuation;

pub use config::{Config, ReferenceAssets, ValuationAccountRegistry};
pub use datasource::{
    DataSourceError, ExternalQuoteStore, HistoricalIndicatorAccessor, HorizonClient,
    LedgerAccountSource, LedgerQuoteSource, MockLedger, StaticHistory, StaticQuoteStore,
};
pub use domain::{AccountId, AssetInfo, Decimal, FundSnapshot, Indicator, IndicatorId};
pub use engine::{IndicatorCatalog, IndicatorRegistry};
pub use error::AppError;
pub use orchestration::{FundStructure, IndicatorReport, Orchestrator, SnapshotAssembler};
pub use pricing::{PriceCache, PriceDiscoveryService};
pub use valuation::{ValuationResolver, ValuationScanner};
