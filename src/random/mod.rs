//! Random variables and sample histograms
//!
//! Everything stochastic in the simulation goes through a [`RandomVariable`]:
//! it knows its sampling [`Law`], its deterministic default and keeps the
//! history of every value drawn, which a [`Histogram`] turns into PDF/CDF
//! and percentile queries.

mod histogram;
mod variable;

pub use histogram::{Histogram, HistogramError};
pub use variable::{DiscretePoint, Law, RandomError, RandomVariable};

use serde::{Deserialize, Serialize};

/// How random quantities are resolved during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimulationMode {
    /// Every random variable takes its default value
    #[default]
    Deterministic,
    /// Every random variable is sampled once per run
    Random,
}

impl SimulationMode {
    pub fn is_random(&self) -> bool {
        matches!(self, SimulationMode::Random)
    }
}
