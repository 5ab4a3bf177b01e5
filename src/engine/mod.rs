//! Indicator computation engine.
//!
//! Calculators declare the indicator ids they produce and the ids they read;
//! the registry orders them into a DAG and runs them one at a time.

use crate::datasource::{DataSourceError, HistoricalIndicatorAccessor};
use crate::domain::{Decimal, FundSnapshot, Indicator, IndicatorId};
use crate::pricing::PricingError;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod analytics;
pub mod balances;
pub mod catalog;
pub mod dividends;
pub mod ids;
pub mod market;
pub mod ratios;
pub mod registry;
pub mod tokenomics;

pub use analytics::AnalyticsCalculator;
pub use balances::BalancesCalculator;
pub use catalog::{CatalogEntry, IndicatorCatalog};
pub use dividends::DividendsCalculator;
pub use market::MarketCalculator;
pub use ratios::RatiosCalculator;
pub use registry::IndicatorRegistry;
pub use tokenomics::TokenomicsCalculator;

/// Inputs shared by every calculator of one run.
#[derive(Clone, Copy)]
pub struct CalculationContext<'a> {
    pub snapshot: &'a FundSnapshot,
    pub history: Option<&'a dyn HistoricalIndicatorAccessor>,
    pub cancel: &'a CancellationToken,
}

/// Indicator values computed so far in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedIndicators {
    values: BTreeMap<IndicatorId, Decimal>,
}

impl ComputedIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `id`, zero when it was not computed.
    pub fn value(&self, id: IndicatorId) -> Decimal {
        self.values.get(&id).copied().unwrap_or_default()
    }

    pub fn get(&self, id: IndicatorId) -> Option<Decimal> {
        self.values.get(&id).copied()
    }

    pub fn contains(&self, id: IndicatorId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn insert(&mut self, id: IndicatorId, value: Decimal) {
        self.values.insert(id, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(IndicatorId, Decimal)> for ComputedIndicators {
    fn from_iter<T: IntoIterator<Item = (IndicatorId, Decimal)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// One node of the indicator DAG.
#[async_trait]
pub trait Calculator: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Indicators this calculator produces.
    fn ids(&self) -> BTreeSet<IndicatorId>;

    /// Indicators this calculator reads from `computed`.
    fn dependencies(&self) -> BTreeSet<IndicatorId>;

    async fn calculate(
        &self,
        ctx: &CalculationContext<'_>,
        computed: &ComputedIndicators,
    ) -> Result<Vec<Indicator>, CalculatorError>;
}

/// Failure inside a single calculator; the registry zero-fills its outputs.
#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error("Calculation cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(String),
}

/// Integrity violations of the calculator graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Indicator {id} produced by both {existing} and {calculator}")]
    DuplicateIndicatorId {
        id: IndicatorId,
        existing: &'static str,
        calculator: &'static str,
    },
    #[error("Dependency cycle through indicators {}", join_ids(.0))]
    DependencyCycle(Vec<IndicatorId>),
    #[error("{calculator} needs indicator {id} which has not been computed")]
    DependencyNotComputed {
        calculator: &'static str,
        id: IndicatorId,
    },
    #[error("{calculator} emitted undeclared indicator {id}")]
    UndeclaredOutput {
        calculator: &'static str,
        id: IndicatorId,
    },
    #[error("{calculator} emitted indicator {id} more than once")]
    RepeatedOutput {
        calculator: &'static str,
        id: IndicatorId,
    },
    #[error("Indicator calculation cancelled")]
    Cancelled,
}

fn join_ids(ids: &[IndicatorId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn id_set(ids: &[IndicatorId]) -> BTreeSet<IndicatorId> {
    ids.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_computed_value_defaults_to_zero() {
        let mut computed = ComputedIndicators::new();
        computed.insert(IndicatorId::new(1), Decimal::from_str("2").unwrap());
        assert_eq!(computed.value(IndicatorId::new(1)), Decimal::from_str("2").unwrap());
        assert_eq!(computed.value(IndicatorId::new(2)), Decimal::zero());
        assert!(computed.get(IndicatorId::new(2)).is_none());
    }

    #[test]
    fn test_registry_error_display_names_ids() {
        let err = RegistryError::DependencyCycle(vec![IndicatorId::new(1), IndicatorId::new(2)]);
        assert_eq!(
            err.to_string(),
            "Dependency cycle through indicators 1, 2"
        );
    }
}
