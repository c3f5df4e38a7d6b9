//! Household members: a common record plus adult or child specifics

use crate::assumptions::HumanLifeModel;
use crate::random::SimulationMode;
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

/// Dated events in a person's life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifeEvent {
    Birth,
    Death,
    Retirement,
    DependencyStart,
    Independence,
}

/// Professional income of an adult until retirement, in constant euros
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WorkIncome {
    /// Employee: net salary before income tax
    #[serde(rename_all = "camelCase")]
    Salary { net_annual: f64 },
    /// Self-employed: turnover before URSSAF levies
    #[serde(rename_all = "camelCase")]
    Turnover { annual_turnover: f64 },
}

/// Right elected by the surviving spouse in a legal succession
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpouseOption {
    #[default]
    UsufructOfAll,
    QuarterInFullOwnership,
    DisposableQuotaInFullOwnership,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdultProfile {
    pub age_of_retirement: u32,
    #[serde(default)]
    pub work_income: Option<WorkIncome>,
    /// Gross annual pension at full rate
    #[serde(default)]
    pub pension: f64,
    /// Quarters still missing for the full rate at retirement, before reforms
    #[serde(default)]
    pub missing_quarters: f64,
    #[serde(default)]
    pub nb_of_years_of_dependency: u32,
    /// When set, the dependency duration is never sampled
    #[serde(default)]
    pub fixed_dependency: bool,
    #[serde(default)]
    pub spouse_option: SpouseOption,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    pub age_of_independence: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PersonKind {
    Adult(AdultProfile),
    Child(ChildProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    pub sex: Sex,
    pub birth_date: NaiveDate,
    /// Age of death for the current run
    pub age_of_death: u32,
    /// When set, the age of death is never sampled
    #[serde(default)]
    pub fixed_age_of_death: bool,
    pub kind: PersonKind,
}

impl Person {
    pub fn birth_year(&self) -> i32 {
        self.birth_date.year()
    }

    /// Age reached during `year`
    pub fn age(&self, year: i32) -> u32 {
        (year - self.birth_year()).max(0) as u32
    }

    pub fn is_adult(&self) -> bool {
        matches!(self.kind, PersonKind::Adult(_))
    }

    pub fn adult_profile(&self) -> Option<&AdultProfile> {
        match &self.kind {
            PersonKind::Adult(profile) => Some(profile),
            PersonKind::Child(_) => None,
        }
    }

    /// Year an event happens, if it applies to this person
    pub fn year_of(&self, event: LifeEvent) -> Option<i32> {
        let birth = self.birth_year();
        match (event, &self.kind) {
            (LifeEvent::Birth, _) => Some(birth),
            (LifeEvent::Death, _) => Some(birth + self.age_of_death as i32),
            (LifeEvent::Retirement, PersonKind::Adult(adult)) => {
                Some(birth + adult.age_of_retirement as i32)
            }
            (LifeEvent::DependencyStart, PersonKind::Adult(adult)) => Some(
                birth + self.age_of_death as i32 - adult.nb_of_years_of_dependency as i32,
            ),
            (LifeEvent::Independence, PersonKind::Child(child)) => {
                Some(birth + child.age_of_independence as i32)
            }
            _ => None,
        }
    }

    fn death_year(&self) -> i32 {
        self.birth_year() + self.age_of_death as i32
    }

    /// Alive during at least part of `year`
    pub fn is_alive(&self, year: i32) -> bool {
        self.birth_year() <= year && year <= self.death_year()
    }

    pub fn is_alive_at_end_of(&self, year: i32) -> bool {
        self.birth_year() <= year && year < self.death_year()
    }

    pub fn is_retired(&self, year: i32) -> bool {
        self.year_of(LifeEvent::Retirement)
            .is_some_and(|retirement| year >= retirement)
    }

    /// Adult in the final years of dependency
    pub fn is_dependent(&self, year: i32) -> bool {
        self.is_alive(year)
            && self
                .year_of(LifeEvent::DependencyStart)
                .is_some_and(|start| year >= start)
    }

    /// Child still counted in the household's tax return
    pub fn is_fiscally_dependent(&self, year: i32) -> bool {
        self.is_alive(year)
            && self
                .year_of(LifeEvent::Independence)
                .is_some_and(|independence| year < independence)
    }

    /// Draw the life parameters of a new run
    ///
    /// The sampled age of death is never below the age reached in
    /// `current_year`.
    pub fn next_random_properties<R: Rng + ?Sized>(
        &mut self,
        human_life: &mut HumanLifeModel,
        mode: SimulationMode,
        current_year: i32,
        rng: &mut R,
    ) {
        if !self.fixed_age_of_death {
            let drawn = human_life.draw_life_expectancy(self.sex, mode, rng);
            self.age_of_death = (drawn.round().max(0.0) as u32).max(self.age(current_year));
        }
        if let PersonKind::Adult(adult) = &mut self.kind {
            if !adult.fixed_dependency {
                let drawn = human_life.draw_nb_of_years_of_dependency(mode, rng);
                adult.nb_of_years_of_dependency = drawn.round().max(0.0) as u32;
            }
        }
    }
}
