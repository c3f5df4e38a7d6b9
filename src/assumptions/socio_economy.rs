//! Socio-economic scenario: pension devaluation, quarters to full pension,
//! expense under-estimation

use super::ScenarioError;
use crate::random::{Law, RandomVariable, SimulationMode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SocioEconomyKey {
    PensionDevaluationRate,
    ExtraQuartersToFullPension,
    ExpensesUnderEvaluationRate,
}

impl SocioEconomyKey {
    pub const ALL: [SocioEconomyKey; 3] = [
        SocioEconomyKey::PensionDevaluationRate,
        SocioEconomyKey::ExtraQuartersToFullPension,
        SocioEconomyKey::ExpensesUnderEvaluationRate,
    ];
}

pub type SocioEconomyValues = BTreeMap<SocioEconomyKey, f64>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocioEconomyModel {
    /// Yearly loss of purchasing power of pensions
    pub pension_devaluation_rate: RandomVariable,
    /// Quarters added by future reforms to the full-pension requirement
    pub extra_quarters_to_full_pension: RandomVariable,
    /// Fraction by which the household under-estimates its expenses
    pub expenses_under_evaluation_rate: RandomVariable,
    /// Pension reduction per missing quarter
    pub pension_decote_per_quarter: f64,
    /// Maximum pension reduction
    pub pension_max_decote: f64,
}

impl Default for SocioEconomyModel {
    fn default() -> Self {
        Self {
            pension_devaluation_rate: RandomVariable::build(
                "Pension devaluation rate",
                Law::Beta {
                    alpha: 2.0,
                    beta: 3.0,
                    min: 0.0,
                    max: 0.02,
                },
                0.005,
            ),
            extra_quarters_to_full_pension: RandomVariable::build(
                "Extra quarters to full pension",
                Law::Uniform { min: 0.0, max: 8.0 },
                0.0,
            ),
            expenses_under_evaluation_rate: RandomVariable::build(
                "Expenses under-evaluation rate",
                Law::Beta {
                    alpha: 2.0,
                    beta: 4.0,
                    min: 0.0,
                    max: 0.10,
                },
                0.0,
            ),
            pension_decote_per_quarter: 0.00625,
            pension_max_decote: 0.25,
        }
    }
}

impl SocioEconomyModel {
    fn variable(&self, key: SocioEconomyKey) -> &RandomVariable {
        match key {
            SocioEconomyKey::PensionDevaluationRate => &self.pension_devaluation_rate,
            SocioEconomyKey::ExtraQuartersToFullPension => &self.extra_quarters_to_full_pension,
            SocioEconomyKey::ExpensesUnderEvaluationRate => &self.expenses_under_evaluation_rate,
        }
    }

    fn variable_mut(&mut self, key: SocioEconomyKey) -> &mut RandomVariable {
        match key {
            SocioEconomyKey::PensionDevaluationRate => &mut self.pension_devaluation_rate,
            SocioEconomyKey::ExtraQuartersToFullPension => {
                &mut self.extra_quarters_to_full_pension
            }
            SocioEconomyKey::ExpensesUnderEvaluationRate => {
                &mut self.expenses_under_evaluation_rate
            }
        }
    }

    /// Draw the values of a new run
    pub fn next_run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SocioEconomyValues {
        SocioEconomyKey::ALL
            .iter()
            .map(|&key| (key, self.variable_mut(key).next(rng)))
            .collect()
    }

    pub fn current_values(
        &self,
        mode: SimulationMode,
    ) -> Result<SocioEconomyValues, ScenarioError> {
        SocioEconomyKey::ALL
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

    pub fn set_random_value(&mut self, values: &SocioEconomyValues) {
        for (&key, &value) in values {
            self.variable_mut(key).set_value(value);
        }
    }

    pub fn reset_random_history(&mut self) {
        SocioEconomyKey::ALL
            .iter()
            .for_each(|&key| self.variable_mut(key).reset_history());
    }

    /// Pension reduction caused by the missing quarters
    pub fn pension_decote(&self, missing_quarters: f64) -> f64 {
        (missing_quarters.max(0.0).round() * self.pension_decote_per_quarter)
            .min(self.pension_max_decote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_pension_decote_is_capped() {
        let model = SocioEconomyModel::default();
        assert_abs_diff_eq!(model.pension_decote(4.0), 0.025);
        assert_abs_diff_eq!(model.pension_decote(100.0), 0.25);
        assert_abs_diff_eq!(model.pension_decote(-3.0), 0.0);
    }

    #[test]
    fn test_next_run_draws_all_keys() {
        let mut model = SocioEconomyModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let values = model.next_run(&mut rng);
        assert_eq!(values.len(), SocioEconomyKey::ALL.len());
        let quarters = values[&SocioEconomyKey::ExtraQuartersToFullPension];
        assert!((0.0..=8.0).contains(&quarters));
        assert_eq!(model.pension_devaluation_rate.history().len(), 1);
    }
}
