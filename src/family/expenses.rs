//! Household living expenses, in constant euros

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifeExpenses {
    /// Fixed household spending while at least one adult is alive
    pub household: f64,
    pub per_adult: f64,
    pub per_dependent_child: f64,
    /// Extra cost of each dependent adult (care, nursing home)
    pub per_dependent_adult: f64,
}

/// Headcount used to size a year's expenses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseHeadcount {
    pub adults: usize,
    pub dependent_children: usize,
    pub dependent_adults: usize,
}

impl LifeExpenses {
    /// Expenses of one year, inflated by the under-estimation rate
    pub fn annual_amount(&self, headcount: ExpenseHeadcount, under_evaluation_rate: f64) -> f64 {
        if headcount.adults == 0 {
            return 0.0;
        }
        let base = self.household
            + self.per_adult * headcount.adults as f64
            + self.per_dependent_child * headcount.dependent_children as f64
            + self.per_dependent_adult * headcount.dependent_adults as f64;
        base * (1.0 + under_evaluation_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_annual_amount() {
        let expenses = LifeExpenses {
            household: 10_000.0,
            per_adult: 5_000.0,
            per_dependent_child: 3_000.0,
            per_dependent_adult: 20_000.0,
        };
        let headcount = ExpenseHeadcount {
            adults: 2,
            dependent_children: 1,
            dependent_adults: 0,
        };
        assert_relative_eq!(expenses.annual_amount(headcount, 0.0), 23_000.0);
        assert_relative_eq!(expenses.annual_amount(headcount, 0.10), 25_300.0, epsilon = 1e-9);
        assert_eq!(expenses.annual_amount(ExpenseHeadcount::default(), 0.1), 0.0);
    }
}
