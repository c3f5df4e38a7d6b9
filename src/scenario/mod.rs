//! Scenario runner for deterministic and Monte-Carlo batches
//!
//! Holds the model configuration and a snapshot of the household, so that
//! every run starts from the same initial state without reloading anything.

mod results;

pub use results::{KpiStatistics, OutcomeCounts, SimulationResultLine, SimulationResultTable};

use crate::config::ModelConfig;
use crate::error::SimulationError;
use crate::household::{Household, HouseholdSnapshot};
use crate::projection::{ProjectionConfig, ProjectionEngine, RunResult};
use crate::random::SimulationMode;
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Parameters of a Monte-Carlo batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloConfig {
    pub nb_runs: u32,
    /// Seed shared by every run; each run draws from its own stream
    pub seed: u64,
    pub projection: ProjectionConfig,
    /// Buckets of the KPI histograms
    pub bucket_count: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            nb_runs: 1_000,
            seed: 42,
            projection: ProjectionConfig {
                mode: SimulationMode::Random,
                simulate_volatility: true,
                detailed_output: false,
                ..ProjectionConfig::default()
            },
            bucket_count: 50,
        }
    }
}

/// Generator of run `run_number`
pub fn run_rng(seed: u64, run_number: u32) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(run_number));
    rng
}

#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    model: ModelConfig,
    snapshot: HouseholdSnapshot,
}

impl ScenarioRunner {
    pub fn new(model: ModelConfig, household: &Household) -> Self {
        Self {
            model,
            snapshot: household.snapshot(),
        }
    }

    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Initial household every run starts from
    pub fn household(&self) -> &Household {
        self.snapshot.household()
    }

    fn run_once(
        &self,
        run_number: u32,
        seed: u64,
        config: ProjectionConfig,
    ) -> Result<RunResult, SimulationError> {
        let mut household = self.snapshot.restore();
        let mut engine = ProjectionEngine::new(&self.model, config);
        let mut rng = run_rng(seed, run_number);
        engine.run(run_number, &mut household, &mut rng)
    }

    /// One run with every random variable at its default value
    pub fn run_deterministic(
        &self,
        config: ProjectionConfig,
    ) -> Result<RunResult, SimulationError> {
        let config = ProjectionConfig {
            mode: SimulationMode::Deterministic,
            ..config
        };
        self.run_once(0, 0, config)
    }

    /// `nb_runs` random runs in parallel
    ///
    /// Afterwards the generators' histories hold exactly the values drawn
    /// by the batch.
    pub fn run_monte_carlo(
        &mut self,
        config: &MonteCarloConfig,
    ) -> Result<SimulationResultTable, SimulationError> {
        let start = Instant::now();
        let projection = ProjectionConfig {
            mode: SimulationMode::Random,
            ..config.projection.clone()
        };
        let runs: Vec<RunResult> = (0..config.nb_runs)
            .into_par_iter()
            .map(|run_number| self.run_once(run_number, config.seed, projection.clone()))
            .collect::<Result<_, _>>()?;

        self.model.assumptions.reset_random_history();
        for run in &runs {
            self.model.assumptions.record_run(&run.sampled.scenario);
        }

        let mut table: SimulationResultTable =
            runs.into_iter().map(SimulationResultLine::from).collect();
        table.sort_by_run_number();
        let counts = table.outcome_counts();
        info!(
            "{} runs in {:?}: {} reached, {} undefined, {} missed",
            table.len(),
            start.elapsed(),
            counts.all_objectives_reached,
            counts.some_objective_undefined,
            counts.some_objective_missed
        );
        Ok(table)
    }

    /// Run `run_number` of a batch again, keeping every yearly line
    pub fn replay_run(
        &self,
        config: &MonteCarloConfig,
        run_number: u32,
    ) -> Result<RunResult, SimulationError> {
        let projection = ProjectionConfig {
            mode: SimulationMode::Random,
            detailed_output: true,
            ..config.projection.clone()
        };
        self.run_once(run_number, config.seed, projection)
    }

    /// Run a batch line again from its recorded inputs, keeping every yearly
    /// line
    pub fn replay_line(
        &self,
        projection: &ProjectionConfig,
        line: &SimulationResultLine,
    ) -> Result<RunResult, SimulationError> {
        let config = ProjectionConfig {
            mode: SimulationMode::Random,
            detailed_output: true,
            ..projection.clone()
        };
        let mut household = self.snapshot.restore();
        let mut engine = ProjectionEngine::new(&self.model, config);
        engine.replay(line.run_number, &mut household, &line.sampled)
    }
}
