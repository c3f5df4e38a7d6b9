//! Cash-flow output structures, one line per simulated year

use serde::{Deserialize, Serialize};

/// A labelled amount in constant euros
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

/// Ordered list of labelled amounts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedValueTable {
    pub items: Vec<NamedValue>,
}

impl NamedValueTable {
    /// Append an amount; zero amounts are not kept
    pub fn add(&mut self, name: impl Into<String>, value: f64) {
        if value != 0.0 {
            self.items.push(NamedValue {
                name: name.into(),
                value,
            });
        }
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.value).sum()
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.items.iter().find(|i| i.name == name).map(|i| i.value)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Financial gains taxed the year after they are realized
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayedTaxation {
    /// Base of the flat tax (PFU)
    pub flat_tax_base: f64,
    /// Base of the social levies on financial revenue
    pub social_levies_base: f64,
}

impl DelayedTaxation {
    pub fn add(&mut self, flat_tax_base: f64, social_levies_base: f64) {
        self.flat_tax_base += flat_tax_base.max(0.0);
        self.social_levies_base += social_levies_base.max(0.0);
    }
}

/// Revenues, taxes and spending of the adults for one year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowLine {
    pub year: i32,
    /// Adults alive during the year
    pub nb_adults: usize,

    // Tables per category
    pub revenues: NamedValueTable,
    pub taxes: NamedValueTable,
    pub expenses: NamedValueTable,

    /// Income subject to the progressive income tax
    pub taxable_income: f64,
    /// Revenues minus taxes and expenses
    pub net_cash_flow: f64,
    pub deposited: f64,
    pub withdrawn: f64,
    /// Levies withheld by life-insurance contracts on withdrawals
    pub withheld_levies: f64,
    /// Cash the household could not find
    pub missing_cash: f64,
    /// Bases taxed this year, realized the year before
    pub delayed_in: DelayedTaxation,
    /// Bases realized this year, taxed next year
    pub delayed_out: DelayedTaxation,
}

impl CashFlowLine {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    pub fn total_revenues(&self) -> f64 {
        self.revenues.total()
    }

    pub fn total_taxes(&self) -> f64 {
        self.taxes.total()
    }

    pub fn total_expenses(&self) -> f64 {
        self.expenses.total()
    }

    /// Close the line: net cash flow from the three tables
    pub fn settle(&mut self) -> f64 {
        self.net_cash_flow = self.total_revenues() - self.total_taxes() - self.total_expenses();
        self.net_cash_flow
    }
}
