//! Economic scenario: inflation, secured-asset rate and stock rate
//!
//! The three rates are drawn once per run. When volatility is simulated, a
//! yearly rate is additionally drawn around each run's mean, producing one
//! sample per simulated year.

use super::ScenarioError;
use crate::random::{Law, RandomVariable, SimulationMode};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Random quantities of the economic model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EconomyKey {
    Inflation,
    SecuredRate,
    StockRate,
}

impl EconomyKey {
    pub const ALL: [EconomyKey; 3] = [
        EconomyKey::Inflation,
        EconomyKey::SecuredRate,
        EconomyKey::StockRate,
    ];
}

pub type EconomyValues = BTreeMap<EconomyKey, f64>;

/// Nominal annual rates of return for one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub secured: f64,
    pub stock: f64,
}

/// Per-year rates drawn for one run when volatility is simulated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRates {
    pub first_year: i32,
    pub secured: Vec<f64>,
    pub stock: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyModel {
    pub inflation: RandomVariable,
    pub secured_rate: RandomVariable,
    pub stock_rate: RandomVariable,
    /// Standard deviation of the yearly secured rate around the run's mean
    pub secured_volatility: f64,
    /// Standard deviation of the yearly stock rate around the run's mean
    pub stock_volatility: f64,
    #[serde(skip)]
    yearly: Option<YearlyRates>,
}

impl Default for EconomyModel {
    fn default() -> Self {
        Self {
            inflation: RandomVariable::build(
                "Inflation",
                Law::Beta {
                    alpha: 2.0,
                    beta: 2.0,
                    min: 0.0,
                    max: 0.04,
                },
                0.02,
            ),
            secured_rate: RandomVariable::build(
                "Secured rate",
                Law::Beta {
                    alpha: 2.0,
                    beta: 2.0,
                    min: 0.0,
                    max: 0.05,
                },
                0.025,
            ),
            stock_rate: RandomVariable::build(
                "Stock rate",
                Law::Beta {
                    alpha: 2.0,
                    beta: 2.0,
                    min: 0.02,
                    max: 0.10,
                },
                0.06,
            ),
            secured_volatility: 0.01,
            stock_volatility: 0.15,
            yearly: None,
        }
    }
}

impl EconomyModel {
    fn variable(&self, key: EconomyKey) -> &RandomVariable {
        match key {
            EconomyKey::Inflation => &self.inflation,
            EconomyKey::SecuredRate => &self.secured_rate,
            EconomyKey::StockRate => &self.stock_rate,
        }
    }

    fn variable_mut(&mut self, key: EconomyKey) -> &mut RandomVariable {
        match key {
            EconomyKey::Inflation => &mut self.inflation,
            EconomyKey::SecuredRate => &mut self.secured_rate,
            EconomyKey::StockRate => &mut self.stock_rate,
        }
    }

    /// Draw the values of a new run
    pub fn next_run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> EconomyValues {
        EconomyKey::ALL
            .iter()
            .map(|&key| (key, self.variable_mut(key).next(rng)))
            .collect()
    }

    /// Values of the current run, or the defaults in deterministic mode
    pub fn current_values(&self, mode: SimulationMode) -> Result<EconomyValues, ScenarioError> {
        EconomyKey::ALL
            .iter()
            .map(|&key| {
                let variable = self.variable(key);
                let value = match mode {
                    SimulationMode::Deterministic => variable.default_value(),
                    SimulationMode::Random => variable
                        .current()
                        .ok_or_else(|| ScenarioError::NotSampled(variable.name().to_string()))?,
                };
                Ok((key, value))
            })
            .collect()
    }

    /// Replay recorded values
    pub fn set_random_value(&mut self, values: &EconomyValues) {
        for (&key, &value) in values {
            self.variable_mut(key).set_value(value);
        }
    }

    pub fn reset_random_history(&mut self) {
        EconomyKey::ALL
            .iter()
            .for_each(|&key| self.variable_mut(key).reset_history());
        self.yearly = None;
    }

    /// Prepare the rates of every year in `[first_year, last_year]`
    ///
    /// In random mode the run's means are drawn; with `simulate_volatility`
    /// each year's secured and stock rates are then drawn from a normal law
    /// centered on those means.
    pub fn generate_random_samples<R: Rng + ?Sized>(
        &mut self,
        mode: SimulationMode,
        simulate_volatility: bool,
        first_year: i32,
        last_year: i32,
        rng: &mut R,
    ) -> Result<(), ScenarioError> {
        if last_year < first_year {
            return Err(ScenarioError::OutOfBounds {
                year: last_year,
                first_year,
                last_year,
            });
        }
        self.yearly = None;
        if !mode.is_random() {
            return Ok(());
        }

        let values = self.next_run(rng);
        if simulate_volatility {
            let secured_law =
                normal_law(values[&EconomyKey::SecuredRate], self.secured_volatility)?;
            let stock_law = normal_law(values[&EconomyKey::StockRate], self.stock_volatility)?;
            let nb_years = (last_year - first_year + 1) as usize;
            let mut samples = YearlyRates {
                first_year,
                secured: Vec::with_capacity(nb_years),
                stock: Vec::with_capacity(nb_years),
            };
            for _ in 0..nb_years {
                samples.secured.push(secured_law.sample(rng));
                samples.stock.push(stock_law.sample(rng));
            }
            self.yearly = Some(samples);
        }
        Ok(())
    }

    /// Secured and stock rates of `year`
    pub fn rates(&self, year: i32, mode: SimulationMode) -> Result<Rates, ScenarioError> {
        if let Some(samples) = &self.yearly {
            let idx = year - samples.first_year;
            let last_year = samples.first_year + samples.secured.len() as i32 - 1;
            if idx < 0 || year > last_year {
                return Err(ScenarioError::OutOfBounds {
                    year,
                    first_year: samples.first_year,
                    last_year,
                });
            }
            return Ok(Rates {
                secured: samples.secured[idx as usize],
                stock: samples.stock[idx as usize],
            });
        }
        let values = self.current_values(mode)?;
        Ok(Rates {
            secured: values[&EconomyKey::SecuredRate],
            stock: values[&EconomyKey::StockRate],
        })
    }

    pub fn inflation(&self, mode: SimulationMode) -> Result<f64, ScenarioError> {
        Ok(self.current_values(mode)?[&EconomyKey::Inflation])
    }

    /// Per-year rates of the current run, when volatility is simulated
    pub fn yearly_rates(&self) -> Option<&YearlyRates> {
        self.yearly.as_ref()
    }

    /// Replay recorded per-year rates
    pub fn set_yearly_rates(&mut self, rates: Option<YearlyRates>) {
        self.yearly = rates;
    }
}

fn normal_law(mean: f64, volatility: f64) -> Result<Normal<f64>, ScenarioError> {
    Normal::new(mean, volatility).map_err(|_| ScenarioError::InvalidVolatility(volatility))
}
