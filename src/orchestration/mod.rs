//! Pipeline glue: fund structure in, priced snapshot and indicators out.

pub mod orchestrator;
pub mod snapshot;

pub use orchestrator::{run_from_config, IndicatorReport, OrchestrationError, Orchestrator};
pub use snapshot::{AssemblyError, FundAccount, FundStructure, SnapshotAssembler};
