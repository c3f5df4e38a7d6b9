//! Transmission of a deceased adult's patrimony
//!
//! A death triggers a legal succession on the estate and a separate
//! life-insurance succession on the contracts subscribed by the decedent.

mod legal;
mod life_insurance;
mod types;

pub use legal::{disposable_quota, legal_shares, LegalShares, STATE_HEIR};
pub use types::{Inheritance, Succession, SuccessionKind};

use crate::error::SimulationError;
use crate::family::Family;
use crate::fiscal::FiscalModel;
use crate::patrimony::{Ownable, Ownership, Patrimony, ValuationDiscounts};
use log::info;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SuccessionError {
    #[error("{0} is not an adult of the household")]
    NotAnAdult(String),
    #[error("{name} is still alive at the end of {year}")]
    NotDeceased { name: String, year: i32 },
    #[error("life-insurance contract '{contract}' must be held in full by {decedent} alone")]
    SharedContract { contract: String, decedent: String },
}

/// Legal heirs alive at the end of the year of death
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Heirs {
    pub spouse: Option<String>,
    pub children: Vec<String>,
}

impl Heirs {
    pub fn of(decedent: &str, year: i32, family: &Family) -> Self {
        Self {
            spouse: family
                .spouse_of(decedent)
                .filter(|s| s.is_alive_at_end_of(year))
                .map(|s| s.name.clone()),
            children: family
                .children()
                .filter(|c| c.is_alive_at_end_of(year))
                .map(|c| c.name.clone())
                .collect(),
        }
    }
}

pub struct SuccessionManager<'a> {
    fiscal: &'a FiscalModel,
    discounts: &'a ValuationDiscounts,
}

impl<'a> SuccessionManager<'a> {
    pub fn new(fiscal: &'a FiscalModel, discounts: &'a ValuationDiscounts) -> Self {
        Self { fiscal, discounts }
    }

    /// Check every item and clause involving the decedent
    pub fn validate(&self, decedent: &str, patrimony: &Patrimony) -> Result<(), SimulationError> {
        for item in patrimony.assets().chain(patrimony.liabilities()) {
            if item.ownership().has_owner(decedent) {
                item.ownership().validate(item.name())?;
            }
        }
        for contract in patrimony
            .investments
            .iter()
            .filter(|i| i.is_life_insurance() && i.ownership.has_owner(decedent))
        {
            let sole = matches!(
                &contract.ownership,
                Ownership::Full { owners } if owners.len() == 1
            );
            if !sole {
                return Err(SuccessionError::SharedContract {
                    contract: contract.name.clone(),
                    decedent: decedent.to_string(),
                }
                .into());
            }
            if let Some(clause) = contract.clause() {
                clause.validate(&contract.name)?;
            }
        }
        Ok(())
    }

    /// Run the legal and life-insurance successions of an adult who died
    /// during `year`
    pub fn process(
        &self,
        decedent: &str,
        year: i32,
        family: &Family,
        patrimony: &mut Patrimony,
    ) -> Result<Vec<Succession>, SimulationError> {
        let person = family.member(decedent)?;
        if !person.is_adult() {
            return Err(SuccessionError::NotAnAdult(decedent.to_string()).into());
        }
        if person.is_alive_at_end_of(year) {
            return Err(SuccessionError::NotDeceased {
                name: decedent.to_string(),
                year,
            }
            .into());
        }
        self.validate(decedent, patrimony)?;

        let heirs = Heirs::of(decedent, year, family);
        let mut successions = Vec::new();
        if let Some(legal) = self.legal_succession(decedent, year, &heirs, family, patrimony)? {
            successions.push(legal);
        }
        if let Some(life) =
            self.life_insurance_succession(decedent, year, &heirs, family, patrimony)?
        {
            successions.push(life);
        }
        for succession in &successions {
            info!(
                "{}: {:?} succession of {}, taxable {:.0}, tax {:.0}",
                year,
                succession.kind,
                decedent,
                succession.taxable_value,
                succession.total_tax()
            );
        }
        Ok(successions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::LifeEvent;
    use crate::fixtures;
    use crate::patrimony::{
        ClauseBeneficiaries, EvaluationContext, InvestmentKind, LifeInsuranceClause, Owner,
        Regime, Valuator,
    };
    use approx::assert_abs_diff_eq;

    const DEATH_OF_PAUL: i32 = 2040;

    fn process(
        family: &crate::family::Family,
        patrimony: &mut Patrimony,
        decedent: &str,
        year: i32,
    ) -> Vec<Succession> {
        let fiscal = FiscalModel::default();
        let discounts = ValuationDiscounts::default();
        SuccessionManager::new(&fiscal, &discounts)
            .process(decedent, year, family, patrimony)
            .unwrap()
    }

    fn check_invariants(succession: &Succession) {
        assert_abs_diff_eq!(succession.total_percent(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            succession.total_net() + succession.total_tax(),
            succession.taxable_value,
            epsilon = 1e-6
        );
        for inheritance in &succession.inheritances {
            assert_abs_diff_eq!(
                inheritance.net,
                inheritance.brut - inheritance.tax,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_first_death_with_usufruct_of_all() {
        let family = fixtures::couple_with_children();
        assert_eq!(
            family.member("Paul").unwrap().year_of(LifeEvent::Death),
            Some(DEATH_OF_PAUL)
        );
        let mut patrimony = fixtures::couple_patrimony();
        let successions = process(&family, &mut patrimony, "Paul", DEATH_OF_PAUL);
        assert_eq!(successions.len(), 2);
        successions.iter().for_each(check_invariants);

        let legal = &successions[0];
        assert_eq!(legal.kind, SuccessionKind::Legal);
        // Marie is 77: usufruct worth 30%
        let marie = legal.inheritance_of("Marie").unwrap();
        assert_abs_diff_eq!(marie.percent, 0.3, epsilon = 1e-12);
        assert_eq!(marie.tax, 0.0);
        // Half the home and the rented flat with their discounts, half the
        // savings and the PEA
        let estate = 250_000.0 * 0.8 + 200_000.0 * 0.9 + 40_000.0 + 60_000.0;
        assert_abs_diff_eq!(legal.taxable_value, estate, epsilon = 1e-6);
        let alice = legal.inheritance_of("Alice").unwrap();
        assert_abs_diff_eq!(alice.brut, estate * 0.35, epsilon = 1e-6);
        assert!(alice.tax > 0.0);

        // Quasi-usufruct of the liquid assets: Marie owes them back
        let liquid = 40_000.0 + 60_000.0;
        assert_abs_diff_eq!(marie.restitution_debt, liquid, epsilon = 1e-6);
        let restitution = patrimony
            .debts
            .iter()
            .find(|d| d.ownership.has_owner("Marie"))
            .unwrap();
        assert_abs_diff_eq!(restitution.amount, liquid, epsilon = 1e-6);
        assert_abs_diff_eq!(restitution.creditor_share("Bob"), 0.5);

        // The flat is now dismembered, the savings belong to Marie
        let flat = &patrimony.real_estates[1].ownership;
        assert_abs_diff_eq!(flat.share("Marie", Regime::Usufruct), 1.0);
        assert_abs_diff_eq!(flat.share("Alice", Regime::Bare), 0.5);
        let livret = &patrimony.investments[0].ownership;
        assert_abs_diff_eq!(livret.share("Marie", Regime::Full), 1.0);
        assert!(patrimony
            .assets()
            .chain(patrimony.liabilities())
            .all(|item| !item.ownership().has_owner("Paul")));

        // Standard clause: the contract goes to Marie, tax free
        let life = &successions[1];
        assert_eq!(life.kind, SuccessionKind::LifeInsurance);
        assert_abs_diff_eq!(life.taxable_value, 150_000.0);
        assert_eq!(life.total_tax(), 0.0);
        assert!(patrimony.investments.iter().all(|i| !i.is_life_insurance()));
        let proceeds = patrimony
            .investments
            .iter()
            .find(|i| i.name == "Contract (Marie)")
            .unwrap();
        assert_abs_diff_eq!(proceeds.state().value, 150_000.0);
    }

    #[test]
    fn test_transmission_preserves_family_wealth() {
        let family = fixtures::couple_with_children();
        let mut patrimony = fixtures::couple_patrimony();
        let fiscal = FiscalModel::default();
        let discounts = ValuationDiscounts::default();
        let everybody = ["Paul", "Marie", "Alice", "Bob"];
        let before = {
            let valuator = Valuator::new(&fiscal.usufruct_scale, &family, &discounts);
            patrimony
                .net_worth(&everybody, DEATH_OF_PAUL, EvaluationContext::Market, &valuator)
                .unwrap()
        };
        let successions = process(&family, &mut patrimony, "Paul", DEATH_OF_PAUL);
        let taxes: f64 = successions.iter().map(Succession::total_tax).sum();
        let valuator = Valuator::new(&fiscal.usufruct_scale, &family, &discounts);
        let after = patrimony
            .net_worth(&everybody, DEATH_OF_PAUL, EvaluationContext::Market, &valuator)
            .unwrap();
        assert_abs_diff_eq!(after, before - taxes, epsilon = 1e-6);
    }

    #[test]
    fn test_children_inherit_everything_at_second_death() {
        let family = fixtures::couple_with_children();
        let mut patrimony = fixtures::couple_patrimony();
        process(&family, &mut patrimony, "Paul", DEATH_OF_PAUL);
        let successions = process(&family, &mut patrimony, "Marie", 2051);
        let legal = &successions[0];
        check_invariants(legal);
        assert_eq!(legal.inheritances.len(), 2);
        assert_abs_diff_eq!(legal.inheritance_of("Bob").unwrap().percent, 0.5);
        // The usufruct is extinguished and the restitution debt settled
        assert!(patrimony
            .debts
            .iter()
            .all(|d| d.creditors.is_empty() && !d.ownership.has_owner("Marie")));
        let flat = &patrimony.real_estates[1].ownership;
        assert!(!flat.is_dismembered());
        assert_abs_diff_eq!(flat.share("Alice", Regime::Full), 0.5);
    }

    #[test]
    fn test_dismembered_clause() {
        let family = fixtures::couple_with_children();
        let mut patrimony = fixtures::couple_patrimony();
        patrimony.investments[2].kind = InvestmentKind::LifeInsurance {
            clause: LifeInsuranceClause {
                beneficiaries: ClauseBeneficiaries::Dismembered {
                    usufructuaries: vec![Owner::new("Marie", 1.0)],
                    bare_owners: vec![Owner::new("Alice", 0.5), Owner::new("Bob", 0.5)],
                },
                optional: false,
            },
        };
        let successions = process(&family, &mut patrimony, "Paul", DEATH_OF_PAUL);
        let life = &successions[1];
        check_invariants(life);
        // Children hold 70% of 150,000 in bare ownership: 52,500 each, below the abatement
        let alice = life.inheritance_of("Alice").unwrap();
        assert_abs_diff_eq!(alice.brut, 52_500.0, epsilon = 1e-6);
        assert_eq!(alice.tax, 0.0);
        assert_eq!(alice.received_cash, 0.0);
        let marie = life.inheritance_of("Marie").unwrap();
        assert_abs_diff_eq!(marie.received_net_cash, 150_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(marie.restitution_debt, 150_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_estate_without_heir_goes_to_the_state() {
        let family = crate::family::Family {
            members: vec![fixtures::adult(
                "Odile",
                crate::family::Sex::Female,
                chrono::NaiveDate::from_ymd_opt(1950, 1, 1).unwrap(),
                80,
            )],
            expenses: crate::family::LifeExpenses::default(),
        };
        let mut patrimony = Patrimony {
            investments: vec![crate::patrimony::FreeInvestment::new(
                "Livret",
                Ownership::sole("Odile"),
                InvestmentKind::Other,
                0.0,
                30_000.0,
            )],
            ..Patrimony::default()
        };
        let successions = process(&family, &mut patrimony, "Odile", 2030);
        assert!(successions.is_empty());
        let livret = &patrimony.investments[0].ownership;
        assert!(!livret.has_owner("Odile"));
        assert_abs_diff_eq!(livret.share(STATE_HEIR, Regime::Full), 1.0);
    }

    #[test]
    fn test_shared_contract_is_rejected() {
        let family = fixtures::couple_with_children();
        let mut patrimony = fixtures::couple_patrimony();
        patrimony.investments[2].ownership = Ownership::Full {
            owners: vec![Owner::new("Paul", 0.5), Owner::new("Marie", 0.5)],
        };
        let fiscal = FiscalModel::default();
        let discounts = ValuationDiscounts::default();
        let result = SuccessionManager::new(&fiscal, &discounts).process(
            "Paul",
            DEATH_OF_PAUL,
            &family,
            &mut patrimony,
        );
        assert!(matches!(
            result,
            Err(SimulationError::Succession(SuccessionError::SharedContract { .. }))
        ));
    }

    #[test]
    fn test_living_adult_cannot_be_processed() {
        let family = fixtures::couple_with_children();
        let mut patrimony = fixtures::couple_patrimony();
        let fiscal = FiscalModel::default();
        let discounts = ValuationDiscounts::default();
        let result = SuccessionManager::new(&fiscal, &discounts).process(
            "Marie",
            DEATH_OF_PAUL,
            &family,
            &mut patrimony,
        );
        assert!(matches!(
            result,
            Err(SimulationError::Succession(SuccessionError::NotDeceased { .. }))
        ));
    }
}
