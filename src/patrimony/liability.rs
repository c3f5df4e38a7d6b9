//! Liabilities: amortized loans and other debts

use super::finance_math::{self, FinanceError};
use super::ownership::{Owner, Ownership};
use super::valuation::Ownable;
use serde::{Deserialize, Serialize};

/// Constant-annuity loan repaid from `first_year` to `last_year`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub name: String,
    pub ownership: Ownership,
    pub initial_amount: f64,
    pub annual_rate: f64,
    pub first_year: i32,
    pub last_year: i32,
}

impl Loan {
    fn nb_periods(&self) -> i32 {
        self.last_year - self.first_year + 1
    }

    pub fn annual_payment(&self, year: i32) -> Result<f64, FinanceError> {
        if year < self.first_year || year > self.last_year {
            return Ok(0.0);
        }
        finance_math::annuity_payment(self.initial_amount, self.annual_rate, self.nb_periods())
    }

    /// Principal due at the end of `year`
    pub fn outstanding(&self, year: i32) -> Result<f64, FinanceError> {
        if year < self.first_year {
            return Ok(self.initial_amount);
        }
        if year >= self.last_year {
            return Ok(0.0);
        }
        finance_math::remaining_principal(
            self.initial_amount,
            self.annual_rate,
            self.nb_periods(),
            year - self.first_year + 1,
        )
    }
}

impl Ownable for Loan {
    fn name(&self) -> &str {
        &self.name
    }

    fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    fn ownership_mut(&mut self) -> &mut Ownership {
        &mut self.ownership
    }

    fn value(&self, year: i32) -> Result<f64, FinanceError> {
        self.outstanding(year)
    }
}

/// Years over which a debt is repaid in equal parts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repayment {
    pub first_year: i32,
    pub last_year: i32,
}

/// Debt in constant euros, possibly owed to family members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub name: String,
    /// The debtors
    pub ownership: Ownership,
    pub amount: f64,
    #[serde(default)]
    pub repayment: Option<Repayment>,
    /// Family members owed the debt, if any
    #[serde(default)]
    pub creditors: Vec<Owner>,
}

impl Debt {
    /// Debt owed by the usufructuary of fungible assets to the bare owners
    pub fn restitution(
        name: impl Into<String>,
        debtor: &str,
        amount: f64,
        creditors: Vec<Owner>,
    ) -> Self {
        Self {
            name: name.into(),
            ownership: Ownership::sole(debtor),
            amount,
            repayment: None,
            creditors,
        }
    }

    pub fn outstanding(&self, year: i32) -> Result<f64, FinanceError> {
        match self.repayment {
            None => Ok(self.amount),
            Some(r) if year < r.first_year => Ok(self.amount),
            Some(r) if year > r.last_year => Ok(0.0),
            Some(r) => finance_math::residual_value(self.amount, r.first_year, r.last_year, year),
        }
    }

    pub fn annual_payment(&self, year: i32) -> f64 {
        match self.repayment {
            Some(r) if (r.first_year..=r.last_year).contains(&year) => {
                self.amount / (r.last_year - r.first_year + 1) as f64
            }
            _ => 0.0,
        }
    }

    pub fn creditor_share(&self, name: &str) -> f64 {
        self.creditors
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.fraction)
            .sum()
    }
}

impl Ownable for Debt {
    fn name(&self) -> &str {
        &self.name
    }

    fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    fn ownership_mut(&mut self) -> &mut Ownership {
        &mut self.ownership
    }

    fn value(&self, year: i32) -> Result<f64, FinanceError> {
        self.outstanding(year)
    }
}
