//! Flat-rate levies: social levies, URSSAF levies, flat tax

use serde::{Deserialize, Serialize};

/// A levy taking a fixed fraction of a gross amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatRateLevy {
    pub rate: f64,
}

impl FlatRateLevy {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Amount levied on `gross`
    pub fn levy(&self, gross: f64) -> f64 {
        if gross <= 0.0 {
            0.0
        } else {
            gross * self.rate
        }
    }

    /// What remains of `gross` after the levy
    pub fn net(&self, gross: f64) -> f64 {
        if gross <= 0.0 {
            0.0
        } else {
            gross - self.levy(gross)
        }
    }

    /// Gross amount needed to keep `net` after the levy
    pub fn gross(&self, net: f64) -> f64 {
        if net <= 0.0 || self.rate >= 1.0 {
            0.0
        } else {
            net / (1.0 - self.rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_net_and_inverse() {
        let levy = FlatRateLevy::new(0.172);
        assert_relative_eq!(levy.net(1_000.0), 828.0);
        assert_relative_eq!(levy.gross(levy.net(1_000.0)), 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_non_positive_base() {
        let levy = FlatRateLevy::new(0.212);
        assert_eq!(levy.levy(-10.0), 0.0);
        assert_eq!(levy.net(0.0), 0.0);
        assert_eq!(levy.gross(-5.0), 0.0);
    }
}
