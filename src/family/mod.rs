//! Household composition and life events

mod expenses;
mod person;

pub use expenses::{ExpenseHeadcount, LifeExpenses};
pub use person::{
    AdultProfile, ChildProfile, LifeEvent, Person, PersonKind, Sex, SpouseOption, WorkIncome,
};

use crate::assumptions::HumanLifeModel;
use crate::random::SimulationMode;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FamilyError {
    #[error("no family member named '{0}'")]
    UnknownMember(String),
    #[error("family member name '{0}' is used twice")]
    DuplicateName(String),
    #[error("a family needs one or two adults, found {0}")]
    AdultCount(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub members: Vec<Person>,
    #[serde(default)]
    pub expenses: LifeExpenses,
}

impl Family {
    pub fn new(members: Vec<Person>, expenses: LifeExpenses) -> Result<Self, FamilyError> {
        let family = Self { members, expenses };
        family.validate()?;
        Ok(family)
    }

    pub fn validate(&self) -> Result<(), FamilyError> {
        let mut names = HashSet::new();
        if let Some(duplicate) = self.members.iter().find(|p| !names.insert(p.name.as_str())) {
            return Err(FamilyError::DuplicateName(duplicate.name.clone()));
        }
        let nb_adults = self.adults().count();
        if !(1..=2).contains(&nb_adults) {
            return Err(FamilyError::AdultCount(nb_adults));
        }
        Ok(())
    }

    pub fn member(&self, name: &str) -> Result<&Person, FamilyError> {
        self.members
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| FamilyError::UnknownMember(name.to_string()))
    }

    pub fn adults(&self) -> impl Iterator<Item = &Person> {
        self.members.iter().filter(|p| p.is_adult())
    }

    pub fn children(&self) -> impl Iterator<Item = &Person> {
        self.members.iter().filter(|p| !p.is_adult())
    }

    pub fn nb_adults_alive(&self, year: i32) -> usize {
        self.adults().filter(|p| p.is_alive(year)).count()
    }

    pub fn nb_adults_alive_at_end_of(&self, year: i32) -> usize {
        self.adults().filter(|p| p.is_alive_at_end_of(year)).count()
    }

    /// Adults who die during `year`
    pub fn adults_dying_in(&self, year: i32) -> Vec<&Person> {
        self.adults()
            .filter(|p| p.year_of(LifeEvent::Death) == Some(year))
            .collect()
    }

    /// The other adult, if any
    pub fn spouse_of(&self, name: &str) -> Option<&Person> {
        self.adults().find(|p| p.name != name)
    }

    pub fn nb_fiscal_children(&self, year: i32) -> usize {
        self.children()
            .filter(|c| c.is_fiscally_dependent(year))
            .count()
    }

    pub fn expense_headcount(&self, year: i32) -> ExpenseHeadcount {
        ExpenseHeadcount {
            adults: self.nb_adults_alive(year),
            dependent_children: self.nb_fiscal_children(year),
            dependent_adults: self.adults().filter(|p| p.is_dependent(year)).count(),
        }
    }

    /// Draw every member's life parameters for a new run
    pub fn next_random_properties<R: Rng + ?Sized>(
        &mut self,
        human_life: &mut HumanLifeModel,
        mode: SimulationMode,
        current_year: i32,
        rng: &mut R,
    ) {
        for person in &mut self.members {
            person.next_random_properties(human_life, mode, current_year, rng);
        }
    }

    /// Give the members the life parameters recorded by an earlier run
    pub fn set_life_parameters(
        &mut self,
        ages_of_death: &BTreeMap<String, u32>,
        years_of_dependency: &BTreeMap<String, u32>,
    ) {
        for person in &mut self.members {
            if let Some(&age) = ages_of_death.get(&person.name) {
                person.age_of_death = age;
            }
            if let (Some(&years), PersonKind::Adult(adult)) =
                (years_of_dependency.get(&person.name), &mut person.kind)
            {
                adult.nb_of_years_of_dependency = years;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_validation() {
        let couple = fixtures::couple_with_children();
        assert!(couple.validate().is_ok());

        let mut duplicated = couple.clone();
        duplicated.members.push(duplicated.members[0].clone());
        assert!(matches!(
            duplicated.validate(),
            Err(FamilyError::DuplicateName(_))
        ));

        let children_only = Family {
            members: couple.children().cloned().collect(),
            expenses: LifeExpenses::default(),
        };
        assert_eq!(children_only.validate(), Err(FamilyError::AdultCount(0)));
    }

    #[test]
    fn test_set_life_parameters() {
        let mut couple = fixtures::couple_with_children();
        let ages = BTreeMap::from([("Paul".to_string(), 70), ("Alice".to_string(), 60)]);
        let dependency = BTreeMap::from([("Marie".to_string(), 5)]);
        couple.set_life_parameters(&ages, &dependency);

        assert_eq!(couple.member("Paul").unwrap().age_of_death, 70);
        assert_eq!(couple.member("Alice").unwrap().age_of_death, 60);
        let marie = couple.member("Marie").unwrap();
        assert_eq!(marie.age_of_death, 88);
        assert_eq!(marie.adult_profile().unwrap().nb_of_years_of_dependency, 5);
    }

    #[test]
    fn test_alive_counts() {
        let couple = fixtures::couple_with_children();
        let first_death = couple
            .adults()
            .filter_map(|p| p.year_of(LifeEvent::Death))
            .min()
            .unwrap();
        assert_eq!(couple.nb_adults_alive(first_death), 2);
        assert_eq!(couple.nb_adults_alive_at_end_of(first_death), 1);
        assert_eq!(couple.adults_dying_in(first_death).len(), 1);
        assert!(couple.member("nobody").is_err());
    }
}
