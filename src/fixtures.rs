//! Households shared by the unit tests

use crate::family::{
    AdultProfile, ChildProfile, Family, LifeExpenses, Person, PersonKind, Sex, SpouseOption,
    WorkIncome,
};
use crate::patrimony::{
    Acquisition, FreeInvestment, InvestmentKind, LifeInsuranceClause, Loan, Owner, Ownership,
    Patrimony, RealEstate, Rental,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn adult(name: &str, sex: Sex, birth: NaiveDate, age_of_death: u32) -> Person {
    Person {
        name: name.into(),
        sex,
        birth_date: birth,
        age_of_death,
        fixed_age_of_death: false,
        kind: PersonKind::Adult(AdultProfile {
            age_of_retirement: 64,
            work_income: None,
            pension: 0.0,
            missing_quarters: 0.0,
            nb_of_years_of_dependency: 0,
            fixed_dependency: false,
            spouse_option: SpouseOption::UsufructOfAll,
        }),
    }
}

pub fn child(name: &str, sex: Sex, birth: NaiveDate) -> Person {
    Person {
        name: name.into(),
        sex,
        birth_date: birth,
        age_of_death: 90,
        fixed_age_of_death: false,
        kind: PersonKind::Child(ChildProfile {
            age_of_independence: 25,
        }),
    }
}

/// Paul dies in 2040 at 80, Marie in 2051 at 88; Alice and Bob are grown up
pub fn couple_with_children() -> Family {
    let mut paul = adult("Paul", Sex::Male, date(1960, 3, 1), 80);
    let mut marie = adult("Marie", Sex::Female, date(1963, 6, 15), 88);
    if let PersonKind::Adult(profile) = &mut paul.kind {
        profile.work_income = Some(WorkIncome::Salary {
            net_annual: 45_000.0,
        });
        profile.pension = 30_000.0;
        profile.nb_of_years_of_dependency = 2;
    }
    if let PersonKind::Adult(profile) = &mut marie.kind {
        profile.age_of_retirement = 62;
        profile.work_income = Some(WorkIncome::Turnover {
            annual_turnover: 60_000.0,
        });
        profile.pension = 20_000.0;
        profile.missing_quarters = 4.0;
        profile.nb_of_years_of_dependency = 3;
    }
    Family {
        members: vec![
            paul,
            marie,
            child("Alice", Sex::Female, date(1992, 1, 10)),
            child("Bob", Sex::Male, date(1995, 9, 20)),
        ],
        expenses: LifeExpenses {
            household: 12_000.0,
            per_adult: 8_000.0,
            per_dependent_child: 4_000.0,
            per_dependent_adult: 25_000.0,
        },
    }
}

fn joint() -> Ownership {
    Ownership::Full {
        owners: vec![Owner::new("Paul", 0.5), Owner::new("Marie", 0.5)],
    }
}

/// Home, rental flat, savings, PEA, life insurance and a mortgage
pub fn couple_patrimony() -> Patrimony {
    Patrimony {
        real_estates: vec![
            RealEstate {
                name: "Home".into(),
                ownership: joint(),
                acquisition: None,
                estimated_value: 500_000.0,
                estimation_year: 2024,
                annual_appreciation: 0.0,
                primary_residence: true,
                rental: None,
                sale_year: None,
                local_tax: 2_000.0,
            },
            RealEstate {
                name: "Flat".into(),
                ownership: Ownership::sole("Paul"),
                acquisition: Some(Acquisition {
                    year: 2005,
                    price: 120_000.0,
                }),
                estimated_value: 200_000.0,
                estimation_year: 2024,
                annual_appreciation: 0.0,
                primary_residence: false,
                rental: Some(Rental {
                    annual_rent: 9_000.0,
                }),
                sale_year: None,
                local_tax: 1_000.0,
            },
        ],
        investments: vec![
            FreeInvestment::new("Livret", joint(), InvestmentKind::Other, 0.0, 80_000.0),
            FreeInvestment::new(
                "PEA",
                Ownership::sole("Paul"),
                InvestmentKind::Pea,
                0.8,
                60_000.0,
            ),
            FreeInvestment::new(
                "Contract",
                Ownership::sole("Paul"),
                InvestmentKind::LifeInsurance {
                    clause: LifeInsuranceClause::standard(),
                },
                0.3,
                150_000.0,
            ),
        ],
        loans: vec![Loan {
            name: "Mortgage".into(),
            ownership: Ownership::sole("Paul"),
            initial_amount: 100_000.0,
            annual_rate: 0.02,
            first_year: 2020,
            last_year: 2034,
        }],
        debts: vec![],
    }
}
