//! Wealth tax on net taxable wealth (IFI, formerly ISF)

use super::RateGrid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WealthTaxModel {
    pub grid: RateGrid,
    /// No tax below this net taxable wealth
    pub threshold: f64,
    /// Smoothing discount applies below this net taxable wealth
    pub decote_threshold: f64,
    pub decote_base: f64,
    pub decote_rate: f64,
}

impl Default for WealthTaxModel {
    fn default() -> Self {
        Self {
            grid: RateGrid::from_static(&[
                (0.0, 0.0),
                (800_000.0, 0.005),
                (1_300_000.0, 0.007),
                (2_570_000.0, 0.01),
                (5_000_000.0, 0.0125),
                (10_000_000.0, 0.015),
            ]),
            threshold: 1_300_000.0,
            decote_threshold: 1_400_000.0,
            decote_base: 17_500.0,
            decote_rate: 0.0125,
        }
    }
}

impl WealthTaxModel {
    pub fn decote(&self, taxable: f64) -> f64 {
        if taxable >= self.decote_threshold {
            0.0
        } else {
            (self.decote_base - taxable * self.decote_rate).max(0.0)
        }
    }

    pub fn tax(&self, taxable: f64) -> f64 {
        if taxable < self.threshold || taxable <= 0.0 {
            return 0.0;
        }
        (self.grid.tax(taxable) - self.decote(taxable)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_below_threshold() {
        let model = WealthTaxModel::default();
        assert_eq!(model.tax(1_299_999.0), 0.0);
        assert_eq!(model.tax(-1.0), 0.0);
    }

    #[test]
    fn test_decote_smooths_the_threshold() {
        let model = WealthTaxModel::default();
        assert_abs_diff_eq!(model.tax(1_300_000.0), 2_500.0 - 1_250.0, epsilon = 1e-6);
        assert_abs_diff_eq!(model.tax(1_400_000.0), 3_200.0, epsilon = 1e-6);
        let mut previous = 0.0;
        for step in 0..=20 {
            let tax = model.tax(1_300_000.0 + step as f64 * 10_000.0);
            assert!(tax >= previous);
            previous = tax;
        }
    }
}
