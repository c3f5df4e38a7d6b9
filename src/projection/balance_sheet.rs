//! Balance sheet at the end of a year, per owner group

use super::cashflows::NamedValueTable;
use crate::family::Family;
use crate::patrimony::{EvaluationContext, Ownable, OwnershipError, Patrimony, Valuator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerGroup {
    /// Adults alive at the end of the year
    Adults,
    Children,
}

impl OwnerGroup {
    pub fn members(self, family: &Family, year: i32) -> Vec<&str> {
        match self {
            OwnerGroup::Adults => family
                .adults()
                .filter(|p| p.is_alive_at_end_of(year))
                .map(|p| p.name.as_str())
                .collect(),
            OwnerGroup::Children => family
                .children()
                .filter(|p| p.is_alive_at_end_of(year))
                .map(|p| p.name.as_str())
                .collect(),
        }
    }
}

/// Market value of what one owner group holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBalance {
    pub real_estate: NamedValueTable,
    pub investments: NamedValueTable,
    pub receivables: NamedValueTable,
    pub loans: NamedValueTable,
    pub debts: NamedValueTable,
}

impl GroupBalance {
    fn build(
        owners: &[&str],
        year: i32,
        patrimony: &Patrimony,
        valuator: &Valuator,
    ) -> Result<Self, OwnershipError> {
        let mut balance = GroupBalance::default();
        if owners.is_empty() {
            return Ok(balance);
        }
        let context = EvaluationContext::Market;
        for estate in &patrimony.real_estates {
            let value = valuator.group_value(estate, owners, year, context)?;
            balance.real_estate.add(estate.name.as_str(), value);
        }
        for investment in &patrimony.investments {
            let value = valuator.group_value(investment, owners, year, context)?;
            balance.investments.add(investment.name.as_str(), value);
        }
        for loan in &patrimony.loans {
            let value = valuator.group_value(loan, owners, year, context)?;
            balance.loans.add(loan.name.as_str(), value);
        }
        for debt in &patrimony.debts {
            let value = valuator.group_value(debt, owners, year, context)?;
            balance.debts.add(debt.name.as_str(), value);
            let claim: f64 = owners.iter().map(|o| debt.creditor_share(o)).sum();
            balance
                .receivables
                .add(debt.name.as_str(), claim * debt.value(year)?);
        }
        Ok(balance)
    }

    pub fn total_assets(&self) -> f64 {
        self.real_estate.total() + self.investments.total() + self.receivables.total()
    }

    pub fn total_liabilities(&self) -> f64 {
        self.loans.total() + self.debts.total()
    }

    pub fn net_worth(&self) -> f64 {
        self.total_assets() - self.total_liabilities()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetLine {
    pub year: i32,
    pub adults: GroupBalance,
    pub children: GroupBalance,
}

impl BalanceSheetLine {
    pub fn build(
        year: i32,
        family: &Family,
        patrimony: &Patrimony,
        valuator: &Valuator,
    ) -> Result<Self, OwnershipError> {
        Ok(Self {
            year,
            adults: GroupBalance::build(
                &OwnerGroup::Adults.members(family, year),
                year,
                patrimony,
                valuator,
            )?,
            children: GroupBalance::build(
                &OwnerGroup::Children.members(family, year),
                year,
                patrimony,
                valuator,
            )?,
        })
    }

    pub fn group(&self, group: OwnerGroup) -> &GroupBalance {
        match group {
            OwnerGroup::Adults => &self.adults,
            OwnerGroup::Children => &self.children,
        }
    }

    pub fn net_worth(&self, group: OwnerGroup) -> f64 {
        self.group(group).net_worth()
    }
}
