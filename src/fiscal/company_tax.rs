//! Corporate tax (IS) on company profits

use super::RateGrid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyTaxModel {
    pub grid: RateGrid,
}

impl Default for CompanyTaxModel {
    fn default() -> Self {
        Self {
            // Reduced SME rate up to 42,500 €
            grid: RateGrid::from_static(&[(0.0, 0.15), (42_500.0, 0.25)]),
        }
    }
}

impl CompanyTaxModel {
    pub fn tax(&self, profit: f64) -> f64 {
        self.grid.tax(profit)
    }

    /// Profit left after tax; losses are passed through untaxed
    pub fn net_profit(&self, profit: f64) -> f64 {
        profit - self.tax(profit)
    }
}
