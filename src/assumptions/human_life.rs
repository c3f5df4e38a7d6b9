//! Human-life scenario: life expectancy by sex and years of dependency

use super::ScenarioError;
use crate::family::Sex;
use crate::random::{DiscretePoint, Law, RandomVariable, SimulationMode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HumanLifeKey {
    MenLifeExpectancy,
    WomenLifeExpectancy,
    NbOfYearsOfDependency,
}

impl HumanLifeKey {
    pub const ALL: [HumanLifeKey; 3] = [
        HumanLifeKey::MenLifeExpectancy,
        HumanLifeKey::WomenLifeExpectancy,
        HumanLifeKey::NbOfYearsOfDependency,
    ];
}

pub type HumanLifeValues = BTreeMap<HumanLifeKey, f64>;

/// Person-level values drawn during one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeDraws {
    pub men_life_expectancy: Vec<f64>,
    pub women_life_expectancy: Vec<f64>,
    pub nb_of_years_of_dependency: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanLifeModel {
    pub men_life_expectancy: RandomVariable,
    pub women_life_expectancy: RandomVariable,
    pub nb_of_years_of_dependency: RandomVariable,
}

fn discrete(points: &[(f64, f64)]) -> Law {
    Law::Discrete {
        pdf: points.iter().map(|&(x, p)| DiscretePoint { x, p }).collect(),
    }
}

impl Default for HumanLifeModel {
    fn default() -> Self {
        Self {
            men_life_expectancy: RandomVariable::build(
                "Men life expectancy",
                discrete(&[
                    (75.0, 0.10),
                    (78.0, 0.15),
                    (81.0, 0.25),
                    (84.0, 0.25),
                    (87.0, 0.15),
                    (90.0, 0.10),
                ]),
                81.0,
            ),
            women_life_expectancy: RandomVariable::build(
                "Women life expectancy",
                discrete(&[
                    (80.0, 0.10),
                    (83.0, 0.15),
                    (86.0, 0.25),
                    (89.0, 0.25),
                    (92.0, 0.15),
                    (95.0, 0.10),
                ]),
                86.0,
            ),
            nb_of_years_of_dependency: RandomVariable::build(
                "Years of dependency",
                discrete(&[(0.0, 0.30), (2.0, 0.35), (4.0, 0.25), (6.0, 0.10)]),
                2.0,
            ),
        }
    }
}

impl HumanLifeModel {
    fn variable(&self, key: HumanLifeKey) -> &RandomVariable {
        match key {
            HumanLifeKey::MenLifeExpectancy => &self.men_life_expectancy,
            HumanLifeKey::WomenLifeExpectancy => &self.women_life_expectancy,
            HumanLifeKey::NbOfYearsOfDependency => &self.nb_of_years_of_dependency,
        }
    }

    fn variable_mut(&mut self, key: HumanLifeKey) -> &mut RandomVariable {
        match key {
            HumanLifeKey::MenLifeExpectancy => &mut self.men_life_expectancy,
            HumanLifeKey::WomenLifeExpectancy => &mut self.women_life_expectancy,
            HumanLifeKey::NbOfYearsOfDependency => &mut self.nb_of_years_of_dependency,
        }
    }

    pub fn life_expectancy(&self, sex: Sex) -> &RandomVariable {
        match sex {
            Sex::Male => &self.men_life_expectancy,
            Sex::Female => &self.women_life_expectancy,
        }
    }

    /// Draw the values of a new run
    pub fn next_run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> HumanLifeValues {
        HumanLifeKey::ALL
            .iter()
            .map(|&key| (key, self.variable_mut(key).next(rng)))
            .collect()
    }

    pub fn current_values(&self, mode: SimulationMode) -> Result<HumanLifeValues, ScenarioError> {
        HumanLifeKey::ALL
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

    pub fn set_random_value(&mut self, values: &HumanLifeValues) {
        for (&key, &value) in values {
            self.variable_mut(key).set_value(value);
        }
    }

    pub fn reset_random_history(&mut self) {
        HumanLifeKey::ALL
            .iter()
            .for_each(|&key| self.variable_mut(key).reset_history());
    }

    /// Every person-level value recorded so far
    pub fn life_draws(&self) -> LifeDraws {
        LifeDraws {
            men_life_expectancy: self.men_life_expectancy.history().samples().to_vec(),
            women_life_expectancy: self.women_life_expectancy.history().samples().to_vec(),
            nb_of_years_of_dependency: self
                .nb_of_years_of_dependency
                .history()
                .samples()
                .to_vec(),
        }
    }

    /// Append the person-level values of a finished run
    pub fn record_life_draws(&mut self, draws: &LifeDraws) {
        self.men_life_expectancy
            .history_mut()
            .record_all(draws.men_life_expectancy.iter().copied());
        self.women_life_expectancy
            .history_mut()
            .record_all(draws.women_life_expectancy.iter().copied());
        self.nb_of_years_of_dependency
            .history_mut()
            .record_all(draws.nb_of_years_of_dependency.iter().copied());
    }

    /// Life expectancy of one person: drawn and recorded in random mode
    pub fn draw_life_expectancy<R: Rng + ?Sized>(
        &mut self,
        sex: Sex,
        mode: SimulationMode,
        rng: &mut R,
    ) -> f64 {
        let variable = match sex {
            Sex::Male => &mut self.men_life_expectancy,
            Sex::Female => &mut self.women_life_expectancy,
        };
        match mode {
            SimulationMode::Deterministic => variable.default_value(),
            SimulationMode::Random => variable.next(rng),
        }
    }

    /// Years of dependency of one person: drawn and recorded in random mode
    pub fn draw_nb_of_years_of_dependency<R: Rng + ?Sized>(
        &mut self,
        mode: SimulationMode,
        rng: &mut R,
    ) -> f64 {
        match mode {
            SimulationMode::Deterministic => self.nb_of_years_of_dependency.default_value(),
            SimulationMode::Random => self.nb_of_years_of_dependency.next(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_each_person_draw_is_recorded() {
        let mut model = HumanLifeModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..4 {
            let age = model.draw_life_expectancy(Sex::Female, SimulationMode::Random, &mut rng);
            assert!((80.0..=95.0).contains(&age));
        }
        assert_eq!(model.women_life_expectancy.history().len(), 4);
        assert!(model.men_life_expectancy.history().is_empty());
    }

    #[test]
    fn test_deterministic_draws_do_not_record() {
        let mut model = HumanLifeModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let age = model.draw_life_expectancy(Sex::Male, SimulationMode::Deterministic, &mut rng);
        assert_eq!(age, 81.0);
        assert!(model.men_life_expectancy.history().is_empty());
    }

    #[test]
    fn test_next_run_and_replay() {
        let mut model = HumanLifeModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let values = model.next_run(&mut rng);
        assert_eq!(values.len(), 3);
        assert_eq!(model.current_values(SimulationMode::Random).unwrap(), values);

        model.reset_random_history();
        assert!(model.current_values(SimulationMode::Random).is_err());
        model.set_random_value(&values);
        assert_eq!(model.current_values(SimulationMode::Random).unwrap(), values);
    }
}
