//! Progressive rate grid: tax a value through ordered (floor, rate) slices

use super::FiscalError;
use serde::{Deserialize, Serialize};

/// One slice of a progressive grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSlice {
    /// Lower bound of the slice
    pub floor: f64,
    /// Rate applied to the part of the value inside the slice
    pub rate: f64,
}

/// Ordered list of slices starting at 0 with strictly increasing floors
///
/// The tax due on all full slices below each floor is precomputed when the
/// grid is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RateSlice>", into = "Vec<RateSlice>")]
pub struct RateGrid {
    slices: Vec<RateSlice>,
    /// Tax of the full slices below `slices[i].floor`
    cumulated_tax: Vec<f64>,
}

impl TryFrom<Vec<RateSlice>> for RateGrid {
    type Error = FiscalError;

    fn try_from(slices: Vec<RateSlice>) -> Result<Self, Self::Error> {
        RateGrid::new(slices)
    }
}

impl From<RateGrid> for Vec<RateSlice> {
    fn from(grid: RateGrid) -> Self {
        grid.slices
    }
}

impl RateGrid {
    pub fn new(slices: Vec<RateSlice>) -> Result<Self, FiscalError> {
        let invalid = |reason: String| Err(FiscalError::InvalidGrid(reason));
        let Some(first) = slices.first() else {
            return invalid("empty grid".into());
        };
        if first.floor != 0.0 {
            return invalid(format!("first floor is {} instead of 0", first.floor));
        }
        for slice in &slices {
            if !slice.floor.is_finite() || !(0.0..=1.0).contains(&slice.rate) {
                return invalid(format!("invalid slice {:?}", slice));
            }
        }
        if let Some(pair) = slices.windows(2).find(|w| w[1].floor <= w[0].floor) {
            return invalid(format!(
                "floors not strictly increasing: {} then {}",
                pair[0].floor, pair[1].floor
            ));
        }

        let mut cumulated_tax = Vec::with_capacity(slices.len());
        let mut running = 0.0;
        cumulated_tax.push(0.0);
        for pair in slices.windows(2) {
            running += (pair[1].floor - pair[0].floor) * pair[0].rate;
            cumulated_tax.push(running);
        }
        Ok(Self {
            slices,
            cumulated_tax,
        })
    }

    /// Build from `(floor, rate)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, FiscalError> {
        Self::new(
            pairs
                .iter()
                .map(|&(floor, rate)| RateSlice { floor, rate })
                .collect(),
        )
    }

    /// Grid of built-in defaults, known to be valid
    pub(crate) fn from_static(pairs: &[(f64, f64)]) -> Self {
        let slices: Vec<RateSlice> = pairs
            .iter()
            .map(|&(floor, rate)| RateSlice { floor, rate })
            .collect();
        let mut cumulated_tax = vec![0.0];
        let mut running = 0.0;
        for pair in slices.windows(2) {
            running += (pair[1].floor - pair[0].floor) * pair[0].rate;
            cumulated_tax.push(running);
        }
        Self {
            slices,
            cumulated_tax,
        }
    }

    pub fn slices(&self) -> &[RateSlice] {
        &self.slices
    }

    /// Index of the slice containing `value` (highest floor ≤ value)
    pub fn slice_index(&self, value: f64) -> usize {
        self.slices
            .partition_point(|s| s.floor <= value)
            .saturating_sub(1)
    }

    /// Tax due on `value`; 0 for a value ≤ 0
    pub fn tax(&self, value: f64) -> f64 {
        if value <= 0.0 {
            return 0.0;
        }
        let idx = self.slice_index(value);
        let slice = &self.slices[idx];
        self.cumulated_tax[idx] + (value - slice.floor) * slice.rate
    }

    /// Rate of the slice containing `value`
    pub fn marginal_rate(&self, value: f64) -> f64 {
        if value <= 0.0 {
            return 0.0;
        }
        self.slices[self.slice_index(value)].rate
    }

    /// Tax divided by value
    pub fn average_rate(&self, value: f64) -> f64 {
        if value <= 0.0 {
            0.0
        } else {
            self.tax(value) / value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn grid() -> RateGrid {
        RateGrid::from_pairs(&[
            (0.0, 0.0),
            (10_777.0, 0.11),
            (27_478.0, 0.30),
            (78_570.0, 0.41),
            (168_994.0, 0.45),
        ])
        .unwrap()
    }

    /// Tax computed by walking every slice independently
    fn tax_by_slices(grid: &RateGrid, value: f64) -> f64 {
        let slices = grid.slices();
        slices
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let upper = slices.get(i + 1).map(|n| n.floor).unwrap_or(f64::INFINITY);
                (value.min(upper) - s.floor).max(0.0) * s.rate
            })
            .sum()
    }

    #[test]
    fn test_boundaries_are_not_double_counted() {
        let grid = grid();
        for slice in grid.slices() {
            let v = slice.floor;
            assert_abs_diff_eq!(grid.tax(v), tax_by_slices(&grid, v), epsilon = 1e-9);
        }
        for v in [5_000.0, 20_000.0, 50_000.0, 100_000.0, 500_000.0] {
            assert_abs_diff_eq!(grid.tax(v), tax_by_slices(&grid, v), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_tax_of_non_positive_value_is_zero() {
        let grid = grid();
        assert_eq!(grid.tax(0.0), 0.0);
        assert_eq!(grid.tax(-1_000.0), 0.0);
        assert_eq!(grid.average_rate(-5.0), 0.0);
    }

    #[test]
    fn test_marginal_and_average_rate() {
        let grid = grid();
        assert_eq!(grid.marginal_rate(30_000.0), 0.30);
        assert_eq!(grid.marginal_rate(27_478.0), 0.30);
        let avg = grid.average_rate(30_000.0);
        assert!(avg > 0.0 && avg < 0.30);
    }

    #[test]
    fn test_invalid_grids_are_rejected() {
        assert!(RateGrid::from_pairs(&[]).is_err());
        assert!(RateGrid::from_pairs(&[(100.0, 0.1)]).is_err());
        assert!(RateGrid::from_pairs(&[(0.0, 0.1), (50.0, 0.2), (50.0, 0.3)]).is_err());
        assert!(RateGrid::from_pairs(&[(0.0, 1.5)]).is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let ok: RateGrid =
            serde_json::from_str(r#"[{"floor":0.0,"rate":0.15},{"floor":42500.0,"rate":0.25}]"#)
                .unwrap();
        assert_abs_diff_eq!(ok.tax(50_000.0), 42_500.0 * 0.15 + 7_500.0 * 0.25);
        assert!(serde_json::from_str::<RateGrid>(r#"[{"floor":10.0,"rate":0.1}]"#).is_err());
    }
}
