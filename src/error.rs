//! Crate-wide error type

use crate::assumptions::{ConfigError, ScenarioError};
use crate::family::FamilyError;
use crate::fiscal::FiscalError;
use crate::patrimony::{FinanceError, OwnershipError};
use crate::random::{HistogramError, RandomError};
use crate::succession::SuccessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Random(#[from] RandomError),
    #[error(transparent)]
    Histogram(#[from] HistogramError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Fiscal(#[from] FiscalError),
    #[error(transparent)]
    Ownership(#[from] OwnershipError),
    #[error(transparent)]
    Family(#[from] FamilyError),
    #[error(transparent)]
    Finance(#[from] FinanceError),
    #[error(transparent)]
    Succession(#[from] SuccessionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The model reached a state it cannot represent; the run is aborted
    #[error("model invariant violated: {0}")]
    ModelInvariant(String),
}

pub type SimulationResult<T> = Result<T, SimulationError>;
