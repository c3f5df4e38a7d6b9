//! Succession records

use crate::fiscal::Relationship;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuccessionKind {
    Legal,
    LifeInsurance,
}

/// What one heir receives from one succession
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inheritance {
    pub heir: String,
    pub relationship: Relationship,
    /// Share of the taxable value
    pub percent: f64,
    /// Taxable value received, before abatement
    pub brut: f64,
    /// Part of `brut` covered by the abatement
    pub abatement_fraction: f64,
    pub tax: f64,
    /// `brut − tax`
    pub net: f64,
    /// Cash received before tax
    pub received_cash: f64,
    /// Cash actually credited
    pub received_net_cash: f64,
    /// Amount the heir must give back to the bare owners (quasi-usufruct)
    pub restitution_debt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Succession {
    pub kind: SuccessionKind,
    pub year: i32,
    pub decedent: String,
    pub taxable_value: f64,
    pub inheritances: Vec<Inheritance>,
}

impl Succession {
    pub fn total_percent(&self) -> f64 {
        self.inheritances.iter().map(|i| i.percent).sum()
    }

    pub fn total_tax(&self) -> f64 {
        self.inheritances.iter().map(|i| i.tax).sum()
    }

    pub fn total_net(&self) -> f64 {
        self.inheritances.iter().map(|i| i.net).sum()
    }

    pub fn inheritance_of(&self, heir: &str) -> Option<&Inheritance> {
        self.inheritances.iter().find(|i| i.heir == heir)
    }
}
