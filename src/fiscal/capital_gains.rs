//! Real-estate capital-gains tax with holding-duration exemption
//!
//! tax = gain × (1 − works discount) × (1 − exemption(years)) × rate, computed
//! separately for the income-tax part and the social-levies part.

use super::FiscalError;
use serde::{Deserialize, Serialize};

/// From `floor` years of holding on, each further year exempts `rate` more
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExonerationSlice {
    pub floor: u32,
    pub rate: f64,
}

/// Piecewise-linear exemption schedule by holding duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExonerationGrid {
    pub name: String,
    pub slices: Vec<ExonerationSlice>,
    /// Exemption reached at each slice floor
    #[serde(skip)]
    cumulated: Option<Vec<f64>>,
}

impl ExonerationGrid {
    pub fn new(name: impl Into<String>, pairs: &[(u32, f64)]) -> Self {
        Self {
            name: name.into(),
            slices: pairs
                .iter()
                .map(|&(floor, rate)| ExonerationSlice { floor, rate })
                .collect(),
            cumulated: None,
        }
    }

    /// Grid with its exemptions precomputed, for slices known to be valid
    fn built_in(name: &str, pairs: &[(u32, f64)]) -> Self {
        let mut grid = Self::new(name, pairs);
        grid.cumulated = Some(cumulate(&grid.slices));
        grid
    }

    /// Validate the slices and precompute the exemption at each floor
    pub fn initialize(&mut self) -> Result<(), FiscalError> {
        let invalid =
            |reason: String| FiscalError::InvalidGrid(format!("{}: {}", self.name, reason));
        match self.slices.first() {
            None => return Err(invalid("empty grid".into())),
            Some(first) if first.floor != 0 => {
                return Err(invalid(format!("first floor is {}", first.floor)))
            }
            _ => {}
        }
        if self.slices.windows(2).any(|w| w[1].floor <= w[0].floor) {
            return Err(invalid("floors not strictly increasing".into()));
        }
        if self.slices.iter().any(|s| !(0.0..=1.0).contains(&s.rate)) {
            return Err(invalid("rate outside [0, 1]".into()));
        }

        self.cumulated = Some(cumulate(&self.slices));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.cumulated.is_some()
    }

    /// Exempted fraction of the gain after `years` of holding, at most 1
    pub fn exemption(&self, years: u32) -> Result<f64, FiscalError> {
        let cumulated = self
            .cumulated
            .as_ref()
            .ok_or_else(|| FiscalError::NotInitialized(self.name.clone()))?;
        let idx = self
            .slices
            .partition_point(|s| s.floor <= years)
            .saturating_sub(1);
        let slice = &self.slices[idx];
        Ok((cumulated[idx] + (years - slice.floor) as f64 * slice.rate).min(1.0))
    }
}

/// Exemption reached at each slice floor
fn cumulate(slices: &[ExonerationSlice]) -> Vec<f64> {
    let mut cumulated = vec![0.0];
    for pair in slices.windows(2) {
        let previous = cumulated[cumulated.len() - 1];
        let years = pair[1].floor.saturating_sub(pair[0].floor);
        cumulated.push(previous + years as f64 * pair[0].rate);
    }
    cumulated
}

/// Both parts of the tax on one gain
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapitalGainsTax {
    pub income_tax: f64,
    pub social_levies: f64,
}

impl CapitalGainsTax {
    pub fn total(&self) -> f64 {
        self.income_tax + self.social_levies
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGainsTaxModel {
    pub income_tax_grid: ExonerationGrid,
    pub income_tax_rate: f64,
    pub social_levies_grid: ExonerationGrid,
    pub social_levies_rate: f64,
    /// Lump-sum allowance for improvement works
    pub works_discount: f64,
    /// Holding years needed for the works discount
    pub works_discount_min_years: u32,
}

impl Default for CapitalGainsTaxModel {
    fn default() -> Self {
        Self {
            income_tax_grid: ExonerationGrid::built_in(
                "capital gains income tax",
                &[(0, 0.0), (5, 0.06), (21, 0.04), (22, 0.0)],
            ),
            income_tax_rate: 0.19,
            social_levies_grid: ExonerationGrid::built_in(
                "capital gains social levies",
                &[(0, 0.0), (5, 0.0165), (21, 0.016), (22, 0.09), (30, 0.0)],
            ),
            social_levies_rate: 0.172,
            works_discount: 0.15,
            works_discount_min_years: 5,
        }
    }
}

impl CapitalGainsTaxModel {
    pub fn initialize(&mut self) -> Result<(), FiscalError> {
        self.income_tax_grid.initialize()?;
        self.social_levies_grid.initialize()
    }

    fn works_factor(&self, years: u32) -> f64 {
        if years >= self.works_discount_min_years {
            1.0 - self.works_discount
        } else {
            1.0
        }
    }

    /// Tax due on `gain` after `years` of holding
    pub fn tax(&self, gain: f64, years: u32) -> Result<CapitalGainsTax, FiscalError> {
        let income_exemption = self.income_tax_grid.exemption(years)?;
        let social_exemption = self.social_levies_grid.exemption(years)?;
        if gain <= 0.0 {
            return Ok(CapitalGainsTax::default());
        }
        let base = gain * self.works_factor(years);
        Ok(CapitalGainsTax {
            income_tax: base * (1.0 - income_exemption) * self.income_tax_rate,
            social_levies: base * (1.0 - social_exemption) * self.social_levies_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_built_in_grids_pass_validation() {
        let model = CapitalGainsTaxModel::default();
        assert!(model.income_tax_grid.is_initialized());
        assert!(model.social_levies_grid.is_initialized());

        let mut revalidated = model.clone();
        revalidated.initialize().unwrap();
        for years in [0, 5, 6, 21, 22, 29, 30, 45] {
            assert_eq!(
                revalidated.income_tax_grid.exemption(years),
                model.income_tax_grid.exemption(years)
            );
            assert_eq!(
                revalidated.social_levies_grid.exemption(years),
                model.social_levies_grid.exemption(years)
            );
        }
    }

    #[test]
    fn test_exemption_schedule() {
        let model = CapitalGainsTaxModel::default();
        let income = &model.income_tax_grid;
        assert_eq!(income.exemption(3).unwrap(), 0.0);
        assert_abs_diff_eq!(income.exemption(10).unwrap(), 0.30, epsilon = 1e-12);
        assert_abs_diff_eq!(income.exemption(22).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(income.exemption(40).unwrap(), 1.0, epsilon = 1e-12);

        let social = &model.social_levies_grid;
        assert_abs_diff_eq!(social.exemption(22).unwrap(), 0.28, epsilon = 1e-12);
        assert_abs_diff_eq!(social.exemption(30).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uninitialized_grid_fails() {
        let grid = ExonerationGrid::new("raw", &[(0, 0.0), (5, 0.06)]);
        assert_eq!(
            grid.exemption(10),
            Err(FiscalError::NotInitialized("raw".to_string()))
        );
    }

    #[test]
    fn test_tax_formula() {
        let model = CapitalGainsTaxModel::default();
        let tax = model.tax(100_000.0, 10).unwrap();
        assert_abs_diff_eq!(tax.income_tax, 100_000.0 * 0.85 * 0.70 * 0.19, epsilon = 1e-6);
        assert_abs_diff_eq!(
            tax.social_levies,
            100_000.0 * 0.85 * (1.0 - 0.0825) * 0.172,
            epsilon = 1e-6
        );

        // No works discount before the minimum holding duration
        let short = model.tax(100_000.0, 2).unwrap();
        assert_abs_diff_eq!(short.total(), 100_000.0 * (0.19 + 0.172), epsilon = 1e-6);

        assert_eq!(model.tax(-5_000.0, 10).unwrap().total(), 0.0);
    }

    #[test]
    fn test_invalid_grid() {
        let mut grid = ExonerationGrid::new("bad", &[(0, 0.0), (5, 0.06), (5, 0.04)]);
        assert!(grid.initialize().is_err());
    }
}
