//! Liquid investments: savings accounts, PEA, life-insurance contracts

use super::finance_math::FinanceError;
use super::ownership::{Owner, Ownership, OwnershipError};
use super::valuation::Ownable;
use crate::assumptions::Rates;
use serde::{Deserialize, Serialize};

/// Who receives a life-insurance contract at the subscriber's death
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClauseBeneficiaries {
    /// The surviving spouse, or else the children in equal shares
    Standard,
    FullOwnership { beneficiaries: Vec<Owner> },
    #[serde(rename_all = "camelCase")]
    Dismembered {
        usufructuaries: Vec<Owner>,
        bare_owners: Vec<Owner>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeInsuranceClause {
    pub beneficiaries: ClauseBeneficiaries,
    /// Beneficiaries may refuse in favor of the next ones
    #[serde(default)]
    pub optional: bool,
}

impl LifeInsuranceClause {
    pub fn standard() -> Self {
        Self {
            beneficiaries: ClauseBeneficiaries::Standard,
            optional: false,
        }
    }

    pub fn validate(&self, contract: &str) -> Result<(), OwnershipError> {
        match &self.beneficiaries {
            ClauseBeneficiaries::Standard => Ok(()),
            ClauseBeneficiaries::FullOwnership { beneficiaries } => Ownership::Full {
                owners: beneficiaries.clone(),
            }
            .validate(contract),
            ClauseBeneficiaries::Dismembered {
                usufructuaries,
                bare_owners,
            } => {
                if self.optional {
                    return Err(OwnershipError::InvalidClause {
                        item: contract.to_string(),
                        reason: "an optional clause cannot be dismembered".into(),
                    });
                }
                Ownership::Dismembered {
                    usufruct_owners: usufructuaries.clone(),
                    bare_owners: bare_owners.clone(),
                }
                .validate(contract)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InvestmentKind {
    /// Plan d'épargne en actions
    Pea,
    LifeInsurance { clause: LifeInsuranceClause },
    /// Savings accounts and securities accounts, taxed on yearly interest
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentState {
    pub value: f64,
    /// Capital paid in, net of the capital part of withdrawals
    pub invested: f64,
}

impl InvestmentState {
    /// Share of the value made of unrealized gains
    pub fn gains_ratio(&self) -> f64 {
        if self.value <= 0.0 {
            0.0
        } else {
            ((self.value - self.invested) / self.value).clamp(0.0, 1.0)
        }
    }
}

/// Amount actually taken out of an investment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Withdrawal {
    pub amount: f64,
    pub taxable_gains: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeInvestment {
    pub name: String,
    pub ownership: Ownership,
    pub kind: InvestmentKind,
    /// Fraction invested in stocks, the rest in secured assets
    #[serde(default)]
    pub stock_ratio: f64,
    pub initial_state: InvestmentState,
    /// State reached during the current run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<InvestmentState>,
}

impl FreeInvestment {
    pub fn new(
        name: impl Into<String>,
        ownership: Ownership,
        kind: InvestmentKind,
        stock_ratio: f64,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            ownership,
            kind,
            stock_ratio,
            initial_state: InvestmentState {
                value,
                invested: value,
            },
            current_state: None,
        }
    }

    pub fn state(&self) -> InvestmentState {
        self.current_state.unwrap_or(self.initial_state)
    }

    /// Back to the initial state
    pub fn reset_state(&mut self) {
        self.current_state = None;
    }

    pub fn is_life_insurance(&self) -> bool {
        matches!(self.kind, InvestmentKind::LifeInsurance { .. })
    }

    pub fn clause(&self) -> Option<&LifeInsuranceClause> {
        match &self.kind {
            InvestmentKind::LifeInsurance { clause } => Some(clause),
            _ => None,
        }
    }

    pub fn deposit(&mut self, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        let mut state = self.state();
        state.value += amount;
        state.invested += amount;
        self.current_state = Some(state);
    }

    /// Take up to `amount` out; the gains part is pro rata of the value
    pub fn withdraw(&mut self, amount: f64) -> Withdrawal {
        let mut state = self.state();
        let amount = amount.min(state.value).max(0.0);
        if amount == 0.0 {
            return Withdrawal::default();
        }
        let taxable_gains = amount * state.gains_ratio();
        state.value -= amount;
        state.invested = (state.invested - (amount - taxable_gains)).max(0.0);
        self.current_state = Some(state);
        Withdrawal {
            amount,
            taxable_gains,
        }
    }

    /// Real yearly rate of return
    pub fn real_rate(&self, rates: Rates, inflation: f64) -> f64 {
        self.stock_ratio * rates.stock + (1.0 - self.stock_ratio) * rates.secured - inflation
    }

    /// Add one year of real return, returning the interest earned
    ///
    /// Interest of `Other` investments is taxed the year it is earned and
    /// joins the invested capital, so it is not taxed again on withdrawal.
    pub fn capitalize(&mut self, rates: Rates, inflation: f64) -> f64 {
        let mut state = self.state();
        let interest = state.value * self.real_rate(rates, inflation);
        state.value += interest;
        if matches!(self.kind, InvestmentKind::Other) && interest > 0.0 {
            state.invested += interest;
        }
        self.current_state = Some(state);
        interest
    }
}

impl Ownable for FreeInvestment {
    fn name(&self) -> &str {
        &self.name
    }

    fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    fn ownership_mut(&mut self) -> &mut Ownership {
        &mut self.ownership
    }

    fn value(&self, _year: i32) -> Result<f64, FinanceError> {
        Ok(self.state().value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn account() -> FreeInvestment {
        let mut account = FreeInvestment::new(
            "Account",
            Ownership::sole("A"),
            InvestmentKind::Other,
            0.5,
            10_000.0,
        );
        account.current_state = Some(InvestmentState {
            value: 12_000.0,
            invested: 10_000.0,
        });
        account
    }

    #[test]
    fn test_withdraw_splits_gains() {
        let mut account = account();
        let withdrawal = account.withdraw(6_000.0);
        assert_abs_diff_eq!(withdrawal.taxable_gains, 1_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(account.state().value, 6_000.0);
        assert_abs_diff_eq!(account.state().invested, 5_000.0, epsilon = 1e-9);

        let rest = account.withdraw(1e9);
        assert_abs_diff_eq!(rest.amount, 6_000.0);
        assert_eq!(account.state().value, 0.0);
    }

    #[test]
    fn test_capitalize_at_real_rate() {
        let mut account = account();
        let rates = Rates {
            secured: 0.02,
            stock: 0.06,
        };
        let interest = account.capitalize(rates, 0.02);
        assert_abs_diff_eq!(interest, 12_000.0 * 0.02, epsilon = 1e-9);
        account.reset_state();
        assert_eq!(account.state().value, 10_000.0);
    }

    #[test]
    fn test_yearly_taxed_interest_is_not_a_gain_on_withdrawal() {
        let mut account = FreeInvestment::new(
            "Livret",
            Ownership::sole("A"),
            InvestmentKind::Other,
            0.0,
            10_000.0,
        );
        let rates = Rates {
            secured: 0.05,
            stock: 0.0,
        };
        let interest = account.capitalize(rates, 0.0);
        assert_abs_diff_eq!(interest, 500.0, epsilon = 1e-9);

        let withdrawal = account.withdraw(account.state().value);
        assert_abs_diff_eq!(withdrawal.amount, 10_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(withdrawal.taxable_gains, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pea_gains_stay_taxable_on_withdrawal() {
        let mut pea = FreeInvestment::new(
            "PEA",
            Ownership::sole("A"),
            InvestmentKind::Pea,
            1.0,
            10_000.0,
        );
        let rates = Rates {
            secured: 0.0,
            stock: 0.10,
        };
        pea.capitalize(rates, 0.0);
        let withdrawal = pea.withdraw(pea.state().value);
        assert_abs_diff_eq!(withdrawal.taxable_gains, 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_optional_dismembered_clause_is_invalid() {
        let clause = LifeInsuranceClause {
            beneficiaries: ClauseBeneficiaries::Dismembered {
                usufructuaries: vec![Owner::new("B", 1.0)],
                bare_owners: vec![Owner::new("C", 1.0)],
            },
            optional: true,
        };
        assert!(matches!(
            clause.validate("LI"),
            Err(OwnershipError::InvalidClause { .. })
        ));

        let clause = LifeInsuranceClause {
            beneficiaries: ClauseBeneficiaries::FullOwnership {
                beneficiaries: vec![Owner::new("C", 0.5), Owner::new("D", 0.4)],
            },
            optional: true,
        };
        assert!(clause.validate("LI").is_err());
        assert!(LifeInsuranceClause::standard().validate("LI").is_ok());
    }
}
