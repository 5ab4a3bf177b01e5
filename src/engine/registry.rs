//! Dependency-ordered execution of calculators.

use super::{
    AnalyticsCalculator, BalancesCalculator, CalculationContext, Calculator, CalculatorError,
    ComputedIndicators, DividendsCalculator, IndicatorCatalog, MarketCalculator, RatiosCalculator,
    RegistryError, TokenomicsCalculator,
};
use crate::datasource::{HistoricalIndicatorAccessor, LedgerAccountSource, LedgerQuoteSource};
use crate::domain::{Decimal, FundSnapshot, Indicator, IndicatorId};
use crate::pricing::PriceDiscoveryService;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

pub struct IndicatorRegistry {
    catalog: Arc<IndicatorCatalog>,
    calculators: Vec<Box<dyn Calculator>>,
    producers: BTreeMap<IndicatorId, usize>,
}

impl IndicatorRegistry {
    pub fn new(catalog: Arc<IndicatorCatalog>) -> Self {
        Self {
            catalog,
            calculators: Vec::new(),
            producers: BTreeMap::new(),
        }
    }

    /// Registry with every standard calculator.
    pub fn standard(
        catalog: Arc<IndicatorCatalog>,
        prices: Arc<PriceDiscoveryService>,
        accounts: Arc<dyn LedgerAccountSource>,
        quotes: Arc<dyn LedgerQuoteSource>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(catalog);
        registry.register(Box::new(BalancesCalculator::new()))?;
        registry.register(Box::new(MarketCalculator::new(prices, accounts, quotes)))?;
        registry.register(Box::new(RatiosCalculator::new()))?;
        registry.register(Box::new(DividendsCalculator::new()))?;
        registry.register(Box::new(AnalyticsCalculator::new()))?;
        registry.register(Box::new(TokenomicsCalculator::new()))?;
        Ok(registry)
    }

    /// Add a calculator. Its ids must not be claimed by an earlier registration.
    pub fn register(&mut self, calculator: Box<dyn Calculator>) -> Result<(), RegistryError> {
        let ids = calculator.ids();
        for id in &ids {
            if let Some(&existing) = self.producers.get(id) {
                return Err(RegistryError::DuplicateIndicatorId {
                    id: *id,
                    existing: self.calculators[existing].name(),
                    calculator: calculator.name(),
                });
            }
        }

        let index = self.calculators.len();
        for id in ids {
            self.producers.insert(id, index);
        }
        debug!(calculator = calculator.name(), "Registered calculator");
        self.calculators.push(calculator);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    /// Calculator names in execution order.
    pub fn execution_order(&self) -> Result<Vec<&'static str>, RegistryError> {
        Ok(self
            .sorted()?
            .into_iter()
            .map(|index| self.calculators[index].name())
            .collect())
    }

    /// Run every calculator in dependency order and return the indicators sorted by id.
    ///
    /// A calculator that fails has its declared indicators reported as zero.
    /// Only integrity violations and cancellation fail the run.
    pub async fn calculate_all(
        &self,
        snapshot: &FundSnapshot,
        history: Option<&dyn HistoricalIndicatorAccessor>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Indicator>, RegistryError> {
        let order = self.sorted()?;
        let ctx = CalculationContext {
            snapshot,
            history,
            cancel,
        };

        let mut computed = ComputedIndicators::new();
        let mut output = Vec::new();

        for index in order {
            if cancel.is_cancelled() {
                return Err(RegistryError::Cancelled);
            }
            let calculator = &self.calculators[index];
            let name = calculator.name();

            for dep in calculator.dependencies() {
                if !computed.contains(dep) {
                    return Err(RegistryError::DependencyNotComputed {
                        calculator: name,
                        id: dep,
                    });
                }
            }

            let declared = calculator.ids();
            let mut results = match calculator.calculate(&ctx, &computed).await {
                Ok(results) => results,
                Err(CalculatorError::Cancelled) => return Err(RegistryError::Cancelled),
                Err(e) => {
                    warn!(calculator = name, "Calculator failed, reporting zeros: {}", e);
                    Vec::new()
                }
            };

            let mut emitted = BTreeSet::new();
            for indicator in &results {
                if !declared.contains(&indicator.id) {
                    return Err(RegistryError::UndeclaredOutput {
                        calculator: name,
                        id: indicator.id,
                    });
                }
                if !emitted.insert(indicator.id) {
                    return Err(RegistryError::RepeatedOutput {
                        calculator: name,
                        id: indicator.id,
                    });
                }
            }
            for id in &declared {
                if !results.iter().any(|i| i.id == *id) {
                    results.push(Indicator::new(*id, name, Decimal::zero(), ""));
                }
            }

            for mut indicator in results {
                if let Some(entry) = self.catalog.get(indicator.id) {
                    indicator.name = entry.name.clone();
                    indicator.unit = entry.unit.clone();
                }
                computed.insert(indicator.id, indicator.value);
                output.push(indicator);
            }
            debug!(calculator = name, "Calculator finished");
        }

        output.sort_by_key(|indicator| indicator.id);
        info!(indicators = output.len(), "Indicator calculation complete");
        Ok(output)
    }

    /// Depth-first topological order, stable for a fixed registration order.
    fn sorted(&self) -> Result<Vec<usize>, RegistryError> {
        let mut marks = vec![Mark::Unvisited; self.calculators.len()];
        let mut order = Vec::with_capacity(self.calculators.len());

        for index in 0..self.calculators.len() {
            if marks[index] == Mark::Unvisited {
                let mut stack = vec![(index, None)];
                self.visit(index, &mut marks, &mut stack, &mut order)?;
            }
        }
        Ok(order)
    }

    fn visit(
        &self,
        index: usize,
        marks: &mut [Mark],
        stack: &mut Vec<(usize, Option<IndicatorId>)>,
        order: &mut Vec<usize>,
    ) -> Result<(), RegistryError> {
        marks[index] = Mark::InProgress;

        for dep in self.calculators[index].dependencies() {
            // Unproduced dependencies surface at execution time.
            let Some(&producer) = self.producers.get(&dep) else {
                continue;
            };
            match marks[producer] {
                Mark::Done => {}
                Mark::InProgress => {
                    let start = stack
                        .iter()
                        .position(|(i, _)| *i == producer)
                        .unwrap_or(stack.len());
                    let mut cycle: Vec<IndicatorId> = stack
                        .iter()
                        .skip(start + 1)
                        .filter_map(|(_, via)| *via)
                        .collect();
                    cycle.push(dep);
                    return Err(RegistryError::DependencyCycle(cycle));
                }
                Mark::Unvisited => {
                    stack.push((producer, Some(dep)));
                    self.visit(producer, marks, stack, order)?;
                    stack.pop();
                }
            }
        }

        marks[index] = Mark::Done;
        order.push(index);
        Ok(())
    }
}
