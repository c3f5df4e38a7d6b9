//! Real-estate assets, valued in constant euros

use super::finance_math::FinanceError;
use super::ownership::Ownership;
use super::valuation::{DiscountFlags, Ownable};
use crate::fiscal::{CapitalGainsTax, CapitalGainsTaxModel, FiscalError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    pub year: i32,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub annual_rent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealEstate {
    pub name: String,
    pub ownership: Ownership,
    #[serde(default)]
    pub acquisition: Option<Acquisition>,
    pub estimated_value: f64,
    pub estimation_year: i32,
    /// Yearly real appreciation
    #[serde(default)]
    pub annual_appreciation: f64,
    #[serde(default)]
    pub primary_residence: bool,
    #[serde(default)]
    pub rental: Option<Rental>,
    /// Sold during that year
    #[serde(default)]
    pub sale_year: Option<i32>,
    /// Yearly property tax (taxe foncière)
    #[serde(default)]
    pub local_tax: f64,
}

impl RealEstate {
    pub fn is_owned(&self, year: i32) -> bool {
        let acquired = self.acquisition.map_or(true, |a| a.year <= year);
        let not_sold = self.sale_year.map_or(true, |sale| year < sale);
        acquired && not_sold
    }

    pub fn is_sold_in(&self, year: i32) -> bool {
        self.sale_year == Some(year)
    }

    /// Estimated value in `year`, whether owned or not
    pub fn estimated_value_in(&self, year: i32) -> f64 {
        self.estimated_value * (1.0 + self.annual_appreciation).powi(year - self.estimation_year)
    }

    pub fn rent(&self, year: i32) -> f64 {
        match self.rental {
            Some(rental) if self.is_owned(year) => rental.annual_rent,
            _ => 0.0,
        }
    }

    pub fn local_tax(&self, year: i32) -> f64 {
        if self.is_owned(year) {
            self.local_tax
        } else {
            0.0
        }
    }

    /// Sale price and capital-gains tax, when sold in `year`
    pub fn sale(
        &self,
        year: i32,
        model: &CapitalGainsTaxModel,
    ) -> Result<Option<(f64, CapitalGainsTax)>, FiscalError> {
        if !self.is_sold_in(year) {
            return Ok(None);
        }
        let price = self.estimated_value_in(year);
        let tax = match self.acquisition {
            Some(acquisition) if !self.primary_residence => {
                let years = (year - acquisition.year).max(0) as u32;
                model.tax(price - acquisition.price, years)?
            }
            _ => CapitalGainsTax::default(),
        };
        Ok(Some((price, tax)))
    }
}

impl Ownable for RealEstate {
    fn name(&self) -> &str {
        &self.name
    }

    fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    fn ownership_mut(&mut self) -> &mut Ownership {
        &mut self.ownership
    }

    fn value(&self, year: i32) -> Result<f64, FinanceError> {
        if self.is_owned(year) {
            Ok(self.estimated_value_in(year))
        } else {
            Ok(0.0)
        }
    }

    fn discount_flags(&self, year: i32) -> DiscountFlags {
        DiscountFlags {
            primary_residence: self.primary_residence,
            rented: self.rent(year) > 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn flat() -> RealEstate {
        RealEstate {
            name: "Flat".into(),
            ownership: Ownership::sole("A"),
            acquisition: Some(Acquisition {
                year: 2010,
                price: 150_000.0,
            }),
            estimated_value: 250_000.0,
            estimation_year: 2024,
            annual_appreciation: 0.01,
            primary_residence: false,
            rental: Some(Rental {
                annual_rent: 9_000.0,
            }),
            sale_year: Some(2030),
            local_tax: 1_200.0,
        }
    }

    #[test]
    fn test_value_until_sale() {
        let flat = flat();
        assert_abs_diff_eq!(flat.value(2025).unwrap(), 252_500.0, epsilon = 1e-6);
        assert_eq!(flat.value(2030).unwrap(), 0.0);
        assert_eq!(flat.rent(2030), 0.0);
        assert_eq!(flat.rent(2029), 9_000.0);
        assert!(flat.discount_flags(2029).rented);
    }

    #[test]
    fn test_sale_with_capital_gains() {
        let flat = flat();
        let model = CapitalGainsTaxModel::default();
        assert!(flat.sale(2029, &model).unwrap().is_none());
        let (price, tax) = flat.sale(2030, &model).unwrap().unwrap();
        assert_abs_diff_eq!(price, flat.estimated_value_in(2030));
        assert!(tax.total() > 0.0);

        let mut home = flat.clone();
        home.primary_residence = true;
        let (_, tax) = home.sale(2030, &model).unwrap().unwrap();
        assert_eq!(tax.total(), 0.0);
    }
}
