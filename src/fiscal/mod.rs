//! French fiscal model (2023 law)
//!
//! Every tax function returns 0 for a base ≤ 0.

mod brackets;
mod capital_gains;
mod company_tax;
mod income_tax;
mod levies;
mod succession_tax;
mod wealth_tax;

pub use brackets::{RateGrid, RateSlice};
pub use capital_gains::{CapitalGainsTax, CapitalGainsTaxModel, ExonerationGrid, ExonerationSlice};
pub use company_tax::CompanyTaxModel;
pub use income_tax::{Abatement, IncomeTax, IncomeTaxDecote, IncomeTaxModel};
pub use levies::FlatRateLevy;
pub use succession_tax::{
    HeirTax, LifeInsuranceTaxModel, Relationship, SuccessionTaxModel, UsufructBracket,
    UsufructScale,
};
pub use wealth_tax::WealthTaxModel;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FiscalError {
    #[error("invalid rate grid: {0}")]
    InvalidGrid(String),
    #[error("exoneration grid '{0}' used before initialize()")]
    NotInitialized(String),
}

/// Every tax and levy applied by the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FiscalModel {
    pub income_tax: IncomeTaxModel,
    pub wealth_tax: WealthTaxModel,
    pub real_estate_capital_gains: CapitalGainsTaxModel,
    /// Social levies on financial revenue (CSG, CRDS, solidarity levy)
    pub financial_revenue_levies: FlatRateLevy,
    /// URSSAF levies on a self-employed turnover
    pub turnover_levies: FlatRateLevy,
    /// Social levies on pensions
    pub pension_levies: FlatRateLevy,
    /// Flat tax (PFU) on the previous year's financial gains
    pub flat_tax: FlatRateLevy,
    pub company_tax: CompanyTaxModel,
    pub succession: SuccessionTaxModel,
    pub life_insurance: LifeInsuranceTaxModel,
    /// Statutory usufruct value by age of the usufructuary
    pub usufruct_scale: UsufructScale,
}

impl Default for FiscalModel {
    fn default() -> Self {
        Self {
            income_tax: IncomeTaxModel::default(),
            wealth_tax: WealthTaxModel::default(),
            real_estate_capital_gains: CapitalGainsTaxModel::default(),
            financial_revenue_levies: FlatRateLevy::new(0.172),
            turnover_levies: FlatRateLevy::new(0.212),
            pension_levies: FlatRateLevy::new(0.091),
            flat_tax: FlatRateLevy::new(0.128),
            company_tax: CompanyTaxModel::default(),
            succession: SuccessionTaxModel::default(),
            life_insurance: LifeInsuranceTaxModel::default(),
            usufruct_scale: UsufructScale::default(),
        }
    }
}

impl FiscalModel {
    /// Precompute the derived tables that are not serialized
    pub fn initialize(&mut self) -> Result<(), FiscalError> {
        self.real_estate_capital_gains.initialize()
    }
}
