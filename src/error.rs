use crate::config::ConfigError;
use crate::datasource::DataSourceError;
use crate::engine::RegistryError;
use crate::orchestration::{AssemblyError, OrchestrationError};
use crate::pricing::PricingError;
use crate::valuation::ValuationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),
    #[error("Valuation error: {0}")]
    Valuation(#[from] ValuationError),
    #[error("Indicator registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Snapshot error: {0}")]
    Assembly(#[from] AssemblyError),
}

impl From<OrchestrationError> for AppError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::Assembly(e) => AppError::Assembly(e),
            OrchestrationError::Registry(e) => AppError::Registry(e),
        }
    }
}
