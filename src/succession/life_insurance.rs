//! Life-insurance death benefits, paid outside the legal estate

use super::types::{Inheritance, Succession, SuccessionKind};
use super::{Heirs, SuccessionManager};
use crate::error::SimulationError;
use crate::family::Family;
use crate::fiscal::Relationship;
use crate::patrimony::{
    AgeProvider, ClauseBeneficiaries, Debt, FreeInvestment, InvestmentKind, Owner, Ownership,
    OwnershipError, Patrimony,
};
use log::{debug, warn};

/// One beneficiary's rights on one contract
#[derive(Debug, Clone)]
struct Benefit {
    name: String,
    /// Taxable value received
    fiscal: f64,
    /// Fraction of the contract paid to this beneficiary in cash
    cash_fraction: f64,
    /// Bare owners the cash must be restituted to
    restitution_to: Vec<Owner>,
}

#[derive(Debug, Clone)]
struct Payout {
    contract: String,
    stock_ratio: f64,
    value: f64,
    benefits: Vec<Benefit>,
}

/// Beneficiaries still alive at the end of the year, shares renormalized
fn surviving(owners: &[Owner], decedent: &str, year: i32, family: &Family) -> Vec<Owner> {
    let alive: Vec<&Owner> = owners
        .iter()
        .filter(|o| o.name != decedent)
        .filter(|o| {
            // People outside the household are assumed alive
            family
                .member(&o.name)
                .map_or(true, |p| p.is_alive_at_end_of(year))
        })
        .collect();
    let total: f64 = alive.iter().map(|o| o.fraction).sum();
    if total <= 0.0 {
        return vec![];
    }
    alive
        .into_iter()
        .map(|o| Owner::new(o.name.clone(), o.fraction / total))
        .collect()
}

fn in_full(owners: Vec<Owner>, value: f64) -> Vec<Benefit> {
    owners
        .into_iter()
        .map(|o| Benefit {
            name: o.name,
            fiscal: o.fraction * value,
            cash_fraction: o.fraction,
            restitution_to: vec![],
        })
        .collect()
}

impl SuccessionManager<'_> {
    fn relationship(&self, decedent: &str, heir: &str, family: &Family) -> Relationship {
        if family.spouse_of(decedent).is_some_and(|s| s.name == heir) {
            Relationship::Spouse
        } else if family.children().any(|c| c.name == heir) {
            Relationship::Child
        } else {
            Relationship::Other
        }
    }

    fn payout(
        &self,
        contract: &FreeInvestment,
        decedent: &str,
        year: i32,
        heirs: &Heirs,
        family: &Family,
    ) -> Result<Option<Payout>, OwnershipError> {
        let Some(clause) = contract.clause() else {
            return Ok(None);
        };
        let value = contract.state().value;
        let benefits = match &clause.beneficiaries {
            ClauseBeneficiaries::Standard => {
                let owners = match (&heirs.spouse, heirs.children.len()) {
                    (Some(spouse), _) => vec![Owner::new(spouse.clone(), 1.0)],
                    (None, 0) => vec![],
                    (None, n) => heirs
                        .children
                        .iter()
                        .map(|c| Owner::new(c.clone(), 1.0 / n as f64))
                        .collect(),
                };
                in_full(owners, value)
            }
            ClauseBeneficiaries::FullOwnership { beneficiaries } => {
                in_full(surviving(beneficiaries, decedent, year, family), value)
            }
            ClauseBeneficiaries::Dismembered {
                usufructuaries,
                bare_owners,
            } => {
                let usufructuaries = surviving(usufructuaries, decedent, year, family);
                let bare_owners = surviving(bare_owners, decedent, year, family);
                match (usufructuaries.is_empty(), bare_owners.is_empty()) {
                    (true, _) => in_full(bare_owners, value),
                    (false, true) => in_full(usufructuaries, value),
                    (false, false) => {
                        let scale = &self.fiscal.usufruct_scale;
                        let mut benefits = Vec::new();
                        let mut bare_value = 0.0;
                        for u in &usufructuaries {
                            let age = family
                                .age_of(&u.name, year)
                                .ok_or_else(|| OwnershipError::UnknownAge(u.name.clone()))?;
                            bare_value += u.fraction * scale.bare_fraction(age) * value;
                            benefits.push(Benefit {
                                name: u.name.clone(),
                                fiscal: u.fraction * scale.usufruct_fraction(age) * value,
                                cash_fraction: u.fraction,
                                restitution_to: bare_owners.clone(),
                            });
                        }
                        benefits.extend(bare_owners.iter().map(|b| Benefit {
                            name: b.name.clone(),
                            fiscal: b.fraction * bare_value,
                            cash_fraction: 0.0,
                            restitution_to: vec![],
                        }));
                        benefits
                    }
                }
            }
        };
        if benefits.is_empty() {
            warn!(
                "{}: no beneficiary for contract {} of {}, contract kept",
                year, contract.name, decedent
            );
            return Ok(None);
        }
        Ok(Some(Payout {
            contract: contract.name.clone(),
            stock_ratio: contract.stock_ratio,
            value,
            benefits,
        }))
    }

    /// Pay the decedent's life-insurance contracts to their beneficiaries
    ///
    /// The abatement is shared by all contracts of a beneficiary; the tax is
    /// withheld from each contract pro rata of its taxable value.
    pub(super) fn life_insurance_succession(
        &self,
        decedent: &str,
        year: i32,
        heirs: &Heirs,
        family: &Family,
        patrimony: &mut Patrimony,
    ) -> Result<Option<Succession>, SimulationError> {
        let mut payouts = Vec::new();
        for contract in patrimony
            .investments
            .iter()
            .filter(|i| i.is_life_insurance() && i.ownership.has_owner(decedent))
        {
            if let Some(payout) = self.payout(contract, decedent, year, heirs, family)? {
                payouts.push(payout);
            }
        }
        if payouts.is_empty() {
            return Ok(None);
        }

        // Taxable value per beneficiary, over all contracts
        let mut inheritances: Vec<Inheritance> = Vec::new();
        for benefit in payouts.iter().flat_map(|p| &p.benefits) {
            match inheritances.iter_mut().find(|i| i.heir == benefit.name) {
                Some(inheritance) => inheritance.brut += benefit.fiscal,
                None => inheritances.push(Inheritance {
                    heir: benefit.name.clone(),
                    relationship: self.relationship(decedent, &benefit.name, family),
                    percent: 0.0,
                    brut: benefit.fiscal,
                    abatement_fraction: 0.0,
                    tax: 0.0,
                    net: 0.0,
                    received_cash: 0.0,
                    received_net_cash: 0.0,
                    restitution_debt: 0.0,
                }),
            }
        }
        let taxable_value: f64 = inheritances.iter().map(|i| i.brut).sum();
        for inheritance in &mut inheritances {
            let heir_tax = self
                .fiscal
                .life_insurance
                .heir_tax(inheritance.relationship, inheritance.brut);
            inheritance.tax = heir_tax.tax;
            inheritance.net = inheritance.brut - heir_tax.tax;
            if inheritance.brut > 0.0 {
                inheritance.abatement_fraction = heir_tax.abatement / inheritance.brut;
            }
            if taxable_value > 0.0 {
                inheritance.percent = inheritance.brut / taxable_value;
            }
        }
        let tax_rate = |name: &str| {
            inheritances
                .iter()
                .find(|i| i.heir == name)
                .filter(|i| i.brut > 0.0)
                .map_or(0.0, |i| i.tax / i.brut)
        };

        let mut new_investments = Vec::new();
        let mut new_debts = Vec::new();
        let mut cash: Vec<(String, f64, f64, f64)> = Vec::new();
        for payout in &payouts {
            let contract_tax: f64 = payout
                .benefits
                .iter()
                .map(|b| tax_rate(&b.name) * b.fiscal)
                .sum();
            for benefit in payout.benefits.iter().filter(|b| b.cash_fraction > 0.0) {
                let gross = benefit.cash_fraction * payout.value;
                // Bare owners' taxes are withheld from the usufructuary's cash
                let net = if benefit.restitution_to.is_empty() {
                    gross - tax_rate(&benefit.name) * benefit.fiscal
                } else {
                    benefit.cash_fraction * (payout.value - contract_tax)
                };
                let restitution = if benefit.restitution_to.is_empty() {
                    0.0
                } else {
                    new_debts.push(Debt::restitution(
                        format!("Restitution of {}", payout.contract),
                        &benefit.name,
                        net,
                        benefit.restitution_to.clone(),
                    ));
                    net
                };
                cash.push((benefit.name.clone(), gross, net, restitution));
                if net > 0.0 {
                    new_investments.push(FreeInvestment::new(
                        format!("{} ({})", payout.contract, benefit.name),
                        Ownership::sole(benefit.name.as_str()),
                        InvestmentKind::Other,
                        payout.stock_ratio,
                        net,
                    ));
                }
            }
        }
        for (name, gross, net, restitution) in cash {
            if let Some(inheritance) = inheritances.iter_mut().find(|i| i.heir == name) {
                inheritance.received_cash += gross;
                inheritance.received_net_cash += net;
                inheritance.restitution_debt += restitution;
            }
        }

        let paid: Vec<&str> = payouts.iter().map(|p| p.contract.as_str()).collect();
        patrimony
            .investments
            .retain(|i| !(i.is_life_insurance() && paid.contains(&i.name.as_str())));
        debug!(
            "{}: {} life-insurance contract(s) of {} paid out",
            year,
            paid.len(),
            decedent
        );
        patrimony.investments.extend(new_investments);
        patrimony.debts.extend(new_debts);

        Ok(Some(Succession {
            kind: SuccessionKind::LifeInsurance,
            year,
            decedent: decedent.to_string(),
            taxable_value,
            inheritances,
        }))
    }
}
