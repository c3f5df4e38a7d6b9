//! Household assets and liabilities

pub mod finance_math;
mod investment;
mod liability;
mod ownership;
mod real_estate;
mod valuation;

pub use finance_math::FinanceError;
pub use investment::{
    ClauseBeneficiaries, FreeInvestment, InvestmentKind, InvestmentState, LifeInsuranceClause,
    Withdrawal,
};
pub use liability::{Debt, Loan, Repayment};
pub use ownership::{Devolution, Owner, Ownership, OwnershipError, Regime, SHARE_TOLERANCE};
pub use real_estate::{Acquisition, RealEstate, Rental};
pub use valuation::{
    AgeProvider, DiscountFlags, EvaluationContext, Ownable, ValuationDiscounts, Valuator,
};

use crate::error::SimulationError;
use crate::fiscal::FlatRateLevy;
use serde::{Deserialize, Serialize};

/// Name of the account created when no savings account can receive deposits
pub const DEFAULT_SAVINGS_NAME: &str = "Savings";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Patrimony {
    pub real_estates: Vec<RealEstate>,
    pub investments: Vec<FreeInvestment>,
    pub loans: Vec<Loan>,
    pub debts: Vec<Debt>,
}

/// Result of taking cash out of the liquid investments
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CashWithdrawal {
    /// Net cash obtained
    pub obtained: f64,
    /// Gains subject to the flat tax next year
    pub flat_tax_base: f64,
    /// Gains subject to social levies next year
    pub social_levies_base: f64,
    /// Social levies withheld at source on life-insurance gains
    pub withheld_levies: f64,
    /// Cash that could not be found
    pub missing: f64,
}

impl Patrimony {
    pub fn validate(&self) -> Result<(), SimulationError> {
        for item in self.assets().chain(self.liabilities()) {
            item.ownership().validate(item.name())?;
        }
        for investment in &self.investments {
            if let Some(clause) = investment.clause() {
                clause.validate(&investment.name)?;
            }
        }
        for loan in &self.loans {
            loan.annual_payment(loan.first_year)?;
            loan.outstanding(loan.first_year)?;
        }
        for debt in &self.debts {
            if let Some(repayment) = debt.repayment {
                debt.outstanding(repayment.first_year)?;
            }
        }
        Ok(())
    }

    /// Restore the initial state of every liquid investment
    pub fn reset_states(&mut self) {
        self.investments
            .iter_mut()
            .for_each(FreeInvestment::reset_state);
    }

    pub fn assets(&self) -> impl Iterator<Item = &dyn Ownable> {
        self.real_estates
            .iter()
            .map(|r| r as &dyn Ownable)
            .chain(self.investments.iter().map(|i| i as &dyn Ownable))
    }

    pub fn liabilities(&self) -> impl Iterator<Item = &dyn Ownable> {
        self.loans
            .iter()
            .map(|l| l as &dyn Ownable)
            .chain(self.debts.iter().map(|d| d as &dyn Ownable))
    }

    /// Restitution claims held by the given people
    pub fn receivables(&self, owners: &[&str], year: i32) -> Result<f64, FinanceError> {
        self.debts.iter().try_fold(0.0, |acc, debt| {
            let share: f64 = owners.iter().map(|o| debt.creditor_share(o)).sum();
            Ok(acc + share * debt.value(year)?)
        })
    }

    /// Assets minus liabilities attributable to the given people
    pub fn net_worth(
        &self,
        owners: &[&str],
        year: i32,
        context: EvaluationContext,
        valuator: &Valuator,
    ) -> Result<f64, OwnershipError> {
        let mut total = self.receivables(owners, year)?;
        for asset in self.assets() {
            total += valuator.group_value(asset, owners, year, context)?;
        }
        for liability in self.liabilities() {
            total -= valuator.group_value(liability, owners, year, context)?;
        }
        Ok(total)
    }

    /// Liquid investments the given people may freely use
    fn available_investments<'a>(
        &'a mut self,
        owners: &'a [&str],
        life_insurance: bool,
    ) -> impl Iterator<Item = &'a mut FreeInvestment> + 'a {
        self.investments.iter_mut().filter(move |i| {
            i.is_life_insurance() == life_insurance
                && !i.ownership.is_dismembered()
                && i.ownership.is_fully_owned_by(owners)
        })
    }

    /// Put `amount` into the first savings account owned by the given people,
    /// opening one if needed
    pub fn deposit(&mut self, amount: f64, owners: &[&str]) {
        if amount <= 0.0 || owners.is_empty() {
            return;
        }
        if let Some(account) = self.available_investments(owners, false).next() {
            account.deposit(amount);
            return;
        }
        let fraction = 1.0 / owners.len() as f64;
        let ownership = Ownership::Full {
            owners: owners.iter().map(|o| Owner::new(*o, fraction)).collect(),
        };
        let mut account = FreeInvestment::new(
            DEFAULT_SAVINGS_NAME,
            ownership,
            InvestmentKind::Other,
            0.0,
            0.0,
        );
        account.deposit(amount);
        self.investments.push(account);
    }

    /// Take `needed` net cash out of the given people's investments, other
    /// investments first, then life insurance
    pub fn withdraw(
        &mut self,
        needed: f64,
        owners: &[&str],
        financial_levies: &FlatRateLevy,
    ) -> CashWithdrawal {
        let mut result = CashWithdrawal::default();
        let mut remaining = needed.max(0.0);

        for investment in self.available_investments(owners, false) {
            if remaining <= 0.0 {
                break;
            }
            let withdrawal = investment.withdraw(remaining);
            remaining -= withdrawal.amount;
            result.obtained += withdrawal.amount;
            result.flat_tax_base += withdrawal.taxable_gains;
            result.social_levies_base += withdrawal.taxable_gains;
        }

        for contract in self.available_investments(owners, true) {
            if remaining <= 0.0 {
                break;
            }
            // Levies on the gains are withheld: withdraw the gross amount
            let effective =
                FlatRateLevy::new(financial_levies.rate * contract.state().gains_ratio());
            let withdrawal = contract.withdraw(effective.gross(remaining));
            let withheld = financial_levies.levy(withdrawal.taxable_gains);
            let net = withdrawal.amount - withheld;
            remaining -= net;
            result.obtained += net;
            result.withheld_levies += withheld;
            result.flat_tax_base += withdrawal.taxable_gains;
        }

        result.missing = remaining.max(0.0);
        result
    }
}
