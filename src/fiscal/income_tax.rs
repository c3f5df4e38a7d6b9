//! Personal income tax (IRPP) with family quotient

use super::RateGrid;
use serde::{Deserialize, Serialize};

/// Proportional abatement bounded by a floor and a ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Abatement {
    pub rate: f64,
    pub min: f64,
    pub max: f64,
}

impl Abatement {
    /// Amount abated from `income`, never more than the income itself
    pub fn amount(&self, income: f64) -> f64 {
        if income <= 0.0 {
            return 0.0;
        }
        (income * self.rate).max(self.min).min(self.max).min(income)
    }

    pub fn taxable(&self, income: f64) -> f64 {
        (income - self.amount(income)).max(0.0)
    }
}

/// Reduction of small tax amounts: `max(0, base − rate × tax)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeTaxDecote {
    pub single_base: f64,
    pub couple_base: f64,
    pub rate: f64,
}

impl IncomeTaxDecote {
    pub fn amount(&self, tax: f64, nb_adults: usize) -> f64 {
        let base = if nb_adults >= 2 {
            self.couple_base
        } else {
            self.single_base
        };
        (base - self.rate * tax).max(0.0).min(tax.max(0.0))
    }
}

/// Detail of one income tax computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeTax {
    pub taxable_income: f64,
    pub family_parts: f64,
    pub amount: f64,
    pub marginal_rate: f64,
    pub average_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeTaxModel {
    pub grid: RateGrid,
    /// Maximum tax benefit of each half part beyond the adults' parts
    pub quotient_ceiling_per_half_part: f64,
    pub decote: IncomeTaxDecote,
    pub salary_abatement: Abatement,
    pub pension_abatement: Abatement,
    /// Micro-BNC abatement on a self-employed turnover
    pub turnover_abatement_rate: f64,
    /// Micro-foncier abatement on rents
    pub rental_abatement_rate: f64,
}

impl Default for IncomeTaxModel {
    fn default() -> Self {
        Self {
            grid: RateGrid::from_static(&[
                (0.0, 0.0),
                (10_777.0, 0.11),
                (27_478.0, 0.30),
                (78_570.0, 0.41),
                (168_994.0, 0.45),
            ]),
            quotient_ceiling_per_half_part: 1_759.0,
            decote: IncomeTaxDecote {
                single_base: 873.0,
                couple_base: 1_444.0,
                rate: 0.4525,
            },
            salary_abatement: Abatement {
                rate: 0.10,
                min: 472.0,
                max: 13_522.0,
            },
            pension_abatement: Abatement {
                rate: 0.10,
                min: 422.0,
                max: 4_123.0,
            },
            turnover_abatement_rate: 0.34,
            rental_abatement_rate: 0.30,
        }
    }
}

impl IncomeTaxModel {
    /// Number of family parts
    ///
    /// One part per adult, half a part for each of the first two dependent
    /// children, one part from the third on, and half a part more for a
    /// single parent.
    pub fn family_parts(&self, nb_adults: usize, nb_children: usize) -> f64 {
        let adults = nb_adults.max(1) as f64;
        let children = nb_children.min(2) as f64 * 0.5 + nb_children.saturating_sub(2) as f64;
        let single_parent = if nb_adults <= 1 && nb_children > 0 {
            0.5
        } else {
            0.0
        };
        adults + children + single_parent
    }

    pub fn salary_taxable(&self, net_salary: f64) -> f64 {
        self.salary_abatement.taxable(net_salary)
    }

    pub fn pension_taxable(&self, pension: f64) -> f64 {
        self.pension_abatement.taxable(pension)
    }

    pub fn turnover_taxable(&self, turnover: f64) -> f64 {
        (turnover * (1.0 - self.turnover_abatement_rate)).max(0.0)
    }

    pub fn rent_taxable(&self, rent: f64) -> f64 {
        (rent * (1.0 - self.rental_abatement_rate)).max(0.0)
    }

    /// Household income tax on the total taxable income
    pub fn irpp(&self, taxable_income: f64, nb_adults: usize, nb_children: usize) -> IncomeTax {
        let family_parts = self.family_parts(nb_adults, nb_children);
        if taxable_income <= 0.0 {
            return IncomeTax {
                taxable_income,
                family_parts,
                ..IncomeTax::default()
            };
        }

        let with_quotient = self.grid.tax(taxable_income / family_parts) * family_parts;

        // Family quotient ceiling: the extra parts may not save more than
        // the capped amount per half part
        let adult_parts = nb_adults.max(1) as f64;
        let without_quotient = self.grid.tax(taxable_income / adult_parts) * adult_parts;
        let extra_half_parts = ((family_parts - adult_parts) * 2.0).max(0.0);
        let capped = without_quotient - extra_half_parts * self.quotient_ceiling_per_half_part;
        let raw = with_quotient.max(capped);

        let amount = (raw - self.decote.amount(raw, nb_adults)).max(0.0);

        IncomeTax {
            taxable_income,
            family_parts,
            amount,
            marginal_rate: self.grid.marginal_rate(taxable_income / family_parts),
            average_rate: amount / taxable_income,
        }
    }
}
