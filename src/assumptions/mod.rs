//! Scenario assumptions: economy, human life and socio-economy generators

mod economy;
mod human_life;
pub mod loader;
mod socio_economy;

pub use economy::{EconomyKey, EconomyModel, EconomyValues, Rates, YearlyRates};
pub use human_life::{HumanLifeKey, HumanLifeModel, HumanLifeValues, LifeDraws};
pub use loader::{ConfigError, LoadedModel};
pub use socio_economy::{SocioEconomyKey, SocioEconomyModel, SocioEconomyValues};

use crate::random::SimulationMode;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the scenario generators
#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("year {year} is outside the simulated range [{first_year}, {last_year}]")]
    OutOfBounds {
        year: i32,
        first_year: i32,
        last_year: i32,
    },
    #[error("'{0}' has not been sampled for the current run")]
    NotSampled(String),
    #[error("invalid volatility {0}")]
    InvalidVolatility(f64),
}

/// Values drawn by the generators for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioValues {
    pub economy: EconomyValues,
    pub socio_economy: SocioEconomyValues,
    /// Per-year rates, when volatility is simulated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly_rates: Option<YearlyRates>,
    /// Draws made for the household members
    #[serde(default)]
    pub life: LifeDraws,
}

/// Container for every scenario generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumptions {
    #[serde(default)]
    pub economy: EconomyModel,
    #[serde(default)]
    pub human_life: HumanLifeModel,
    #[serde(default)]
    pub socio_economy: SocioEconomyModel,
}

impl Assumptions {
    /// Prepare the generators for one run over `[first_year, last_year]`
    ///
    /// Person-level draws (life expectancy, dependency) are made by the
    /// family, not here.
    pub fn next_run<R: Rng + ?Sized>(
        &mut self,
        mode: SimulationMode,
        simulate_volatility: bool,
        first_year: i32,
        last_year: i32,
        rng: &mut R,
    ) -> Result<ScenarioValues, ScenarioError> {
        self.economy
            .generate_random_samples(mode, simulate_volatility, first_year, last_year, rng)?;
        if mode.is_random() {
            self.socio_economy.next_run(rng);
        }
        self.current_values(mode)
    }

    pub fn current_values(&self, mode: SimulationMode) -> Result<ScenarioValues, ScenarioError> {
        Ok(ScenarioValues {
            economy: self.economy.current_values(mode)?,
            socio_economy: self.socio_economy.current_values(mode)?,
            yearly_rates: self.economy.yearly_rates().cloned(),
            life: LifeDraws::default(),
        })
    }

    /// Replay the values of a recorded run; nothing is drawn or recorded
    pub fn set_random_values(&mut self, values: &ScenarioValues) {
        self.economy.set_random_value(&values.economy);
        self.economy.set_yearly_rates(values.yearly_rates.clone());
        self.socio_economy.set_random_value(&values.socio_economy);
    }

    pub fn reset_random_history(&mut self) {
        self.economy.reset_random_history();
        self.human_life.reset_random_history();
        self.socio_economy.reset_random_history();
    }

    /// Append the values of a finished run to the generators' histories
    pub fn record_run(&mut self, values: &ScenarioValues) {
        for (key, &value) in &values.economy {
            let variable = match key {
                EconomyKey::Inflation => &mut self.economy.inflation,
                EconomyKey::SecuredRate => &mut self.economy.secured_rate,
                EconomyKey::StockRate => &mut self.economy.stock_rate,
            };
            variable.history_mut().record(value);
        }
        for (key, &value) in &values.socio_economy {
            let variable = match key {
                SocioEconomyKey::PensionDevaluationRate => {
                    &mut self.socio_economy.pension_devaluation_rate
                }
                SocioEconomyKey::ExtraQuartersToFullPension => {
                    &mut self.socio_economy.extra_quarters_to_full_pension
                }
                SocioEconomyKey::ExpensesUnderEvaluationRate => {
                    &mut self.socio_economy.expenses_under_evaluation_rate
                }
            };
            variable.history_mut().record(value);
        }
        self.human_life.record_life_draws(&values.life);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_next_run_deterministic_uses_defaults() {
        let mut assumptions = Assumptions::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let values = assumptions
            .next_run(SimulationMode::Deterministic, false, 2025, 2030, &mut rng)
            .unwrap();
        assert_eq!(values.economy[&EconomyKey::Inflation], 0.02);
        assert!(assumptions.economy.inflation.history().is_empty());
    }

    #[test]
    fn test_record_run_feeds_histories() {
        let mut assumptions = Assumptions::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut worker = assumptions.clone();
        let values = worker
            .next_run(SimulationMode::Random, false, 2025, 2030, &mut rng)
            .unwrap();

        assumptions.record_run(&values);
        assumptions.record_run(&values);
        assert_eq!(assumptions.economy.stock_rate.history().len(), 2);
        assert_eq!(
            assumptions.socio_economy.pension_devaluation_rate.history().len(),
            2
        );
    }
}
