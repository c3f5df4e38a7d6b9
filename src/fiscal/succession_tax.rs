//! Inheritance taxes: legal succession, life insurance, usufruct scale

use super::RateGrid;
use serde::{Deserialize, Serialize};

/// Link between the decedent and an heir, which drives the tax regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Spouse,
    Child,
    Other,
}

/// Tax owed by one heir on one succession
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeirTax {
    /// Abatement actually consumed
    pub abatement: f64,
    /// Taxable value after abatement
    pub net_taxable: f64,
    pub tax: f64,
}

/// Legal succession (droits de mutation à titre gratuit)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessionTaxModel {
    pub child_abatement: f64,
    pub direct_line_grid: RateGrid,
    pub other_abatement: f64,
    pub other_grid: RateGrid,
}

impl Default for SuccessionTaxModel {
    fn default() -> Self {
        Self {
            child_abatement: 100_000.0,
            direct_line_grid: RateGrid::from_static(&[
                (0.0, 0.05),
                (8_072.0, 0.10),
                (12_109.0, 0.15),
                (15_932.0, 0.20),
                (552_324.0, 0.30),
                (902_838.0, 0.40),
                (1_805_677.0, 0.45),
            ]),
            other_abatement: 1_594.0,
            other_grid: RateGrid::from_static(&[(0.0, 0.60)]),
        }
    }
}

impl SuccessionTaxModel {
    pub fn heir_tax(&self, relationship: Relationship, taxable: f64) -> HeirTax {
        if taxable <= 0.0 {
            return HeirTax::default();
        }
        match relationship {
            Relationship::Spouse => HeirTax {
                abatement: taxable,
                net_taxable: 0.0,
                tax: 0.0,
            },
            Relationship::Child => apply(taxable, self.child_abatement, &self.direct_line_grid),
            Relationship::Other => apply(taxable, self.other_abatement, &self.other_grid),
        }
    }
}

/// Life-insurance death benefits (article 990 I)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeInsuranceTaxModel {
    /// Abatement per beneficiary, shared by all of the decedent's contracts
    pub abatement: f64,
    pub grid: RateGrid,
}

impl Default for LifeInsuranceTaxModel {
    fn default() -> Self {
        Self {
            abatement: 152_500.0,
            grid: RateGrid::from_static(&[(0.0, 0.20), (700_000.0, 0.3125)]),
        }
    }
}

impl LifeInsuranceTaxModel {
    pub fn heir_tax(&self, relationship: Relationship, taxable: f64) -> HeirTax {
        if taxable <= 0.0 {
            return HeirTax::default();
        }
        match relationship {
            Relationship::Spouse => HeirTax {
                abatement: taxable,
                net_taxable: 0.0,
                tax: 0.0,
            },
            _ => apply(taxable, self.abatement, &self.grid),
        }
    }
}

fn apply(taxable: f64, abatement: f64, grid: &RateGrid) -> HeirTax {
    let abatement = abatement.min(taxable).max(0.0);
    let net_taxable = taxable - abatement;
    HeirTax {
        abatement,
        net_taxable,
        tax: grid.tax(net_taxable),
    }
}

/// Usufruct fraction for usufructuaries younger than `below_age`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsufructBracket {
    pub below_age: u32,
    pub fraction: f64,
}

/// Statutory valuation of usufruct by age (article 669 CGI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsufructScale {
    pub brackets: Vec<UsufructBracket>,
    /// Fraction beyond the last bracket
    pub oldest: f64,
}

impl Default for UsufructScale {
    fn default() -> Self {
        let brackets = [
            (21, 0.9),
            (31, 0.8),
            (41, 0.7),
            (51, 0.6),
            (61, 0.5),
            (71, 0.4),
            (81, 0.3),
            (91, 0.2),
        ]
        .iter()
        .map(|&(below_age, fraction)| UsufructBracket {
            below_age,
            fraction,
        })
        .collect();
        Self {
            brackets,
            oldest: 0.1,
        }
    }
}

impl UsufructScale {
    /// Share of the full-ownership value held by a usufructuary of `age`
    pub fn usufruct_fraction(&self, age: u32) -> f64 {
        self.brackets
            .iter()
            .find(|b| age < b.below_age)
            .map_or(self.oldest, |b| b.fraction)
    }

    pub fn bare_fraction(&self, age: u32) -> f64 {
        1.0 - self.usufruct_fraction(age)
    }
}
