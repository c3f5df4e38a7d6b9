//! Patrimony Sim - Monte-Carlo projection engine for household wealth
//!
//! This library provides:
//! - Random variables and economic, demographic and socio-economic scenarios
//! - French personal taxation (income, wealth, capital gains, levies,
//!   succession and life-insurance duties)
//! - Valuation of split ownership (full, usufruct, bare) by context
//! - Successions on the death of an adult
//! - A yearly cash-flow and balance-sheet ledger with KPIs
//! - Deterministic and parallel Monte-Carlo batches

pub mod assumptions;
pub mod config;
pub mod error;
pub mod family;
pub mod fiscal;
pub mod household;
pub mod patrimony;
pub mod projection;
pub mod random;
pub mod report;
pub mod scenario;
pub mod succession;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use assumptions::Assumptions;
pub use config::ModelConfig;
pub use error::{SimulationError, SimulationResult};
pub use household::Household;
pub use projection::{ProjectionConfig, ProjectionEngine, RunResult};
pub use random::SimulationMode;
pub use scenario::{MonteCarloConfig, ScenarioRunner, SimulationResultTable};
