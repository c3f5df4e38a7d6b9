//! The simulated household: family members and their patrimony

use crate::assumptions::loader::load_json;
use crate::assumptions::ConfigError;
use crate::error::SimulationError;
use crate::family::Family;
use crate::patrimony::Patrimony;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Household used by the command line when none is given
pub const DEFAULT_HOUSEHOLD_PATH: &str = "data/household_demo.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Household {
    pub family: Family,
    #[serde(default)]
    pub patrimony: Patrimony,
}

impl Household {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_json(path)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        self.family.validate()?;
        self.patrimony.validate()
    }

    /// Frozen copy every run starts from
    pub fn snapshot(&self) -> HouseholdSnapshot {
        let mut household = self.clone();
        household.patrimony.reset_states();
        HouseholdSnapshot(household)
    }
}

/// Initial state of a household, restored before each run
#[derive(Debug, Clone)]
pub struct HouseholdSnapshot(Household);

impl HouseholdSnapshot {
    /// A fresh deep copy of the initial household
    pub fn restore(&self) -> Household {
        self.0.clone()
    }

    pub fn household(&self) -> &Household {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_snapshot_is_not_affected_by_runs() {
        let household = Household {
            family: fixtures::couple_with_children(),
            patrimony: fixtures::couple_patrimony(),
        };
        let snapshot = household.snapshot();

        let mut run = snapshot.restore();
        run.patrimony.investments[0].deposit(1_000.0);
        run.patrimony.real_estates.clear();

        let fresh = snapshot.restore();
        assert_eq!(fresh, household);
        assert_eq!(fresh.patrimony.investments[0].state().value, 80_000.0);
    }

    #[test]
    fn test_demo_household_loads() {
        let household = Household::load(Path::new(DEFAULT_HOUSEHOLD_PATH)).unwrap();
        household.validate().unwrap();
        assert_eq!(household.family.adults().count(), 2);
        assert_eq!(household.patrimony.investments.len(), 4);
        assert!(household.patrimony.investments[2].is_life_insurance());
    }

    #[test]
    fn test_round_trip_through_json() {
        let household = Household {
            family: fixtures::couple_with_children(),
            patrimony: fixtures::couple_patrimony(),
        };
        assert!(household.validate().is_ok());
        let json = serde_json::to_string(&household).unwrap();
        let parsed: Household = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, household);
    }
}
