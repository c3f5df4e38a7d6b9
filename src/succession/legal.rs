//! Legal heirship: share table by spouse option, estate valuation and
//! transfer of the decedent's rights

use super::types::{Inheritance, Succession, SuccessionKind};
use super::{Heirs, SuccessionManager};
use crate::error::SimulationError;
use crate::family::{Family, SpouseOption};
use crate::fiscal::{Relationship, UsufructScale};
use crate::patrimony::{
    Debt, Devolution, EvaluationContext, Ownable, Owner, Ownership, Patrimony, Regime, Valuator,
};
use log::warn;

/// Owner receiving the estate of a decedent without heirs (déshérence)
pub const STATE_HEIR: &str = "State";

/// Disposable quota left to the spouse for 1, 2, 3 or more children
pub fn disposable_quota(nb_children: usize) -> f64 {
    match nb_children {
        0 => 1.0,
        1 => 0.5,
        2 => 1.0 / 3.0,
        _ => 0.25,
    }
}

/// Fiscal share of each heir and the devolution of the decedent's rights
#[derive(Debug, Clone, PartialEq)]
pub struct LegalShares {
    pub fiscal: Vec<(String, Relationship, f64)>,
    pub devolution: Devolution,
}

/// Share table of a legal succession
///
/// `spouse` carries the surviving spouse's name, age and elected option.
/// Returns `None` when there is no heir.
pub fn legal_shares(
    spouse: Option<(&str, u32, SpouseOption)>,
    children: &[&str],
    scale: &UsufructScale,
) -> Option<LegalShares> {
    let n = children.len();
    let to_children = |total: f64| -> Vec<Owner> {
        children
            .iter()
            .map(|c| Owner::new(*c, total / n as f64))
            .collect()
    };
    let fiscal_children = |total: f64| {
        children
            .iter()
            .map(|c| (c.to_string(), Relationship::Child, total / n as f64))
            .collect::<Vec<_>>()
    };

    match (spouse, n) {
        (None, 0) => None,
        (None, _) => Some(LegalShares {
            fiscal: fiscal_children(1.0),
            devolution: Devolution::in_full(to_children(1.0)),
        }),
        (Some((name, _, _)), 0) => Some(LegalShares {
            fiscal: vec![(name.to_string(), Relationship::Spouse, 1.0)],
            devolution: Devolution::in_full(vec![Owner::new(name, 1.0)]),
        }),
        (Some((name, age, option)), _) => {
            let (spouse_fiscal, devolution) = match option {
                SpouseOption::UsufructOfAll => (
                    scale.usufruct_fraction(age),
                    Devolution {
                        full: vec![],
                        usufruct: vec![Owner::new(name, 1.0)],
                        bare: to_children(1.0),
                    },
                ),
                SpouseOption::QuarterInFullOwnership => {
                    let mut full = vec![Owner::new(name, 0.25)];
                    full.extend(to_children(0.75));
                    (0.25, Devolution::in_full(full))
                }
                SpouseOption::DisposableQuotaInFullOwnership => {
                    let quota = disposable_quota(n);
                    let mut full = vec![Owner::new(name, quota)];
                    full.extend(to_children(1.0 - quota));
                    (quota, Devolution::in_full(full))
                }
            };
            let mut fiscal = vec![(name.to_string(), Relationship::Spouse, spouse_fiscal)];
            fiscal.extend(fiscal_children(1.0 - spouse_fiscal));
            Some(LegalShares { fiscal, devolution })
        }
    }
}

impl SuccessionManager<'_> {
    /// Split the decedent's estate among the legal heirs and transfer the
    /// decedent's rights
    pub(super) fn legal_succession(
        &self,
        decedent: &str,
        year: i32,
        heirs: &Heirs,
        family: &Family,
        patrimony: &mut Patrimony,
    ) -> Result<Option<Succession>, SimulationError> {
        // The option is elected by the surviving spouse
        let spouse = match heirs.spouse.as_deref() {
            Some(name) => {
                let person = family.member(name)?;
                let option = person
                    .adult_profile()
                    .map(|a| a.spouse_option)
                    .unwrap_or_default();
                Some((name, person.age(year), option))
            }
            None => None,
        };
        let children: Vec<&str> = heirs.children.iter().map(String::as_str).collect();
        let Some(shares) = legal_shares(spouse, &children, &self.fiscal.usufruct_scale) else {
            warn!(
                "{}: succession of {} without any heir, estate goes to the State",
                year, decedent
            );
            let escheat = LegalShares {
                fiscal: vec![(STATE_HEIR.to_string(), Relationship::Other, 1.0)],
                devolution: Devolution::in_full(vec![Owner::new(STATE_HEIR, 1.0)]),
            };
            transfer_rights(decedent, &escheat, patrimony);
            return Ok(None);
        };

        let valuator = Valuator::new(&self.fiscal.usufruct_scale, family, self.discounts);
        let mut estate = 0.0;
        for asset in patrimony.assets() {
            if is_life_insurance(patrimony, asset.name()) {
                continue;
            }
            estate += valuator.owned_value(asset, decedent, year, EvaluationContext::Succession)?;
        }
        for liability in patrimony.liabilities() {
            estate -=
                valuator.owned_value(liability, decedent, year, EvaluationContext::Succession)?;
        }
        let taxable_value = estate.max(0.0);

        // Liquid assets held in full pass as cash
        let mut liquid = 0.0;
        for investment in patrimony.investments.iter().filter(|i| !i.is_life_insurance()) {
            liquid +=
                investment.ownership.share(decedent, Regime::Full) * investment.value(year)?;
        }
        let dismembered = shares.devolution.dismembered_fraction();

        let mut inheritances = Vec::with_capacity(shares.fiscal.len());
        for (heir, relationship, percent) in &shares.fiscal {
            let brut = percent * taxable_value;
            let heir_tax = self.fiscal.succession.heir_tax(*relationship, brut);
            let full_part: f64 = shares
                .devolution
                .full
                .iter()
                .filter(|o| &o.name == heir)
                .map(|o| o.fraction)
                .sum();
            let usufruct_part: f64 = shares
                .devolution
                .usufruct
                .iter()
                .filter(|o| &o.name == heir)
                .map(|o| o.fraction)
                .sum();
            let received_cash = (full_part + usufruct_part) * liquid;
            inheritances.push(Inheritance {
                heir: heir.clone(),
                relationship: *relationship,
                percent: *percent,
                brut,
                abatement_fraction: if brut > 0.0 {
                    heir_tax.abatement / brut
                } else {
                    0.0
                },
                tax: heir_tax.tax,
                net: brut - heir_tax.tax,
                received_cash,
                received_net_cash: received_cash - heir_tax.tax,
                restitution_debt: usufruct_part * liquid,
            });
        }

        transfer_rights(decedent, &shares, patrimony);

        if dismembered > 0.0 && liquid > 0.0 {
            let bare_total: f64 = shares.devolution.bare.iter().map(|o| o.fraction).sum();
            for usufructuary in &shares.devolution.usufruct {
                let creditors = shares
                    .devolution
                    .bare
                    .iter()
                    .map(|o| Owner::new(o.name.clone(), o.fraction / bare_total))
                    .collect();
                patrimony.debts.push(Debt::restitution(
                    format!("Restitution of {}'s estate", decedent),
                    &usufructuary.name,
                    usufructuary.fraction * liquid,
                    creditors,
                ));
            }
        }
        for inheritance in inheritances.iter().filter(|i| i.tax > 0.0) {
            patrimony.debts.push(Debt {
                name: format!("Succession tax on {}'s estate", decedent),
                ownership: Ownership::sole(inheritance.heir.as_str()),
                amount: inheritance.tax,
                repayment: None,
                creditors: vec![],
            });
        }

        Ok(Some(Succession {
            kind: SuccessionKind::Legal,
            year,
            decedent: decedent.to_string(),
            taxable_value,
            inheritances,
        }))
    }
}

fn is_life_insurance(patrimony: &Patrimony, name: &str) -> bool {
    patrimony
        .investments
        .iter()
        .any(|i| i.name == name && i.is_life_insurance())
}

/// Move the decedent's rights on every non life-insurance item to the heirs
fn transfer_rights(decedent: &str, shares: &LegalShares, patrimony: &mut Patrimony) {
    let liability_devolution = Devolution::in_full(
        shares
            .fiscal
            .iter()
            .map(|(name, _, percent)| Owner::new(name.clone(), *percent))
            .collect(),
    );
    let quasi_usufruct = shares.devolution.quasi_usufruct();

    for estate in patrimony
        .real_estates
        .iter_mut()
        .filter(|r| r.ownership.has_owner(decedent))
    {
        estate.ownership.transfer(decedent, &shares.devolution);
    }
    for investment in patrimony
        .investments
        .iter_mut()
        .filter(|i| !i.is_life_insurance() && i.ownership.has_owner(decedent))
    {
        let devolution = if investment.ownership.share(decedent, Regime::Full) > 0.0 {
            &quasi_usufruct
        } else {
            &shares.devolution
        };
        investment.ownership.transfer(decedent, devolution);
    }
    for loan in patrimony
        .loans
        .iter_mut()
        .filter(|l| l.ownership.has_owner(decedent))
    {
        loan.ownership.transfer(decedent, &liability_devolution);
    }

    // Restitution debts owed by the decedent are settled out of the estate
    patrimony
        .debts
        .retain(|d| d.creditors.is_empty() || !d.ownership.has_owner(decedent));
    for debt in patrimony
        .debts
        .iter_mut()
        .filter(|d| d.ownership.has_owner(decedent))
    {
        debt.ownership.transfer(decedent, &liability_devolution);
    }
}
