//! Value of an item attributable to one owner, by evaluation context
//!
//! | regime   | Market                 | WealthTax | Succession             |
//! |----------|------------------------|-----------|------------------------|
//! | Full     | s·V                    | s·V       | s·V                    |
//! | Usufruct | s·u(age)·V             | s·V       | 0                      |
//! | Bare     | s·Σ sᵤ(1 − u(ageᵤ))·V  | 0         | s·Σ sᵤ(1 − u(ageᵤ))·V  |
//!
//! `u(age)` is the statutory usufruct fraction of a usufructuary. Discounts
//! only apply under the WealthTax and Succession contexts.

use super::finance_math::FinanceError;
use super::ownership::{Ownership, OwnershipError, Regime};
use crate::family::Family;
use crate::fiscal::UsufructScale;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluationContext {
    Market,
    WealthTax,
    Succession,
}

/// Properties of an item that may entitle it to a discount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscountFlags {
    pub primary_residence: bool,
    pub rented: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValuationDiscounts {
    pub primary_residence_wealth_tax: f64,
    pub primary_residence_succession: f64,
    pub rented: f64,
    pub undivided: f64,
}

impl Default for ValuationDiscounts {
    fn default() -> Self {
        Self {
            primary_residence_wealth_tax: 0.30,
            primary_residence_succession: 0.20,
            rented: 0.10,
            undivided: 0.0,
        }
    }
}

impl ValuationDiscounts {
    /// Multiplier applied to an attributed value
    pub fn factor(&self, flags: DiscountFlags, undivided: bool, context: EvaluationContext) -> f64 {
        let primary_residence = match context {
            EvaluationContext::Market => return 1.0,
            EvaluationContext::WealthTax => self.primary_residence_wealth_tax,
            EvaluationContext::Succession => self.primary_residence_succession,
        };
        let mut factor = 1.0;
        if flags.primary_residence {
            factor *= 1.0 - primary_residence;
        }
        if flags.rented {
            factor *= 1.0 - self.rented;
        }
        if undivided {
            factor *= 1.0 - self.undivided;
        }
        factor
    }
}

/// Source of people's ages
pub trait AgeProvider {
    fn age_of(&self, name: &str, year: i32) -> Option<u32>;
}

impl AgeProvider for Family {
    fn age_of(&self, name: &str, year: i32) -> Option<u32> {
        self.member(name).ok().map(|p| p.age(year))
    }
}

/// An asset or liability held under an [`Ownership`]
pub trait Ownable {
    fn name(&self) -> &str;
    fn ownership(&self) -> &Ownership;
    fn ownership_mut(&mut self) -> &mut Ownership;
    /// Full-ownership value at the end of `year`
    fn value(&self, year: i32) -> Result<f64, FinanceError>;
    fn discount_flags(&self, _year: i32) -> DiscountFlags {
        DiscountFlags::default()
    }
}

/// Everything needed to value split ownership
pub struct Valuator<'a> {
    scale: &'a UsufructScale,
    ages: &'a dyn AgeProvider,
    discounts: &'a ValuationDiscounts,
}

impl<'a> Valuator<'a> {
    pub fn new(
        scale: &'a UsufructScale,
        ages: &'a dyn AgeProvider,
        discounts: &'a ValuationDiscounts,
    ) -> Self {
        Self {
            scale,
            ages,
            discounts,
        }
    }

    fn age(&self, name: &str, year: i32) -> Result<u32, OwnershipError> {
        self.ages
            .age_of(name, year)
            .ok_or_else(|| OwnershipError::UnknownAge(name.to_string()))
    }

    /// Share of the full value carried by the bare ownership
    fn bare_fraction(&self, ownership: &Ownership, year: i32) -> Result<f64, OwnershipError> {
        match ownership {
            Ownership::Full { .. } => Ok(0.0),
            Ownership::Dismembered {
                usufruct_owners, ..
            } => usufruct_owners.iter().try_fold(0.0, |acc, u| {
                Ok(acc + u.fraction * self.scale.bare_fraction(self.age(&u.name, year)?))
            }),
        }
    }

    /// Fraction of the full value attributed to `owner` through `regime`
    pub fn regime_weight(
        &self,
        ownership: &Ownership,
        owner: &str,
        regime: Regime,
        year: i32,
        context: EvaluationContext,
    ) -> Result<f64, OwnershipError> {
        use EvaluationContext::*;

        let share = ownership.share(owner, regime);
        if share == 0.0 {
            return Ok(0.0);
        }
        Ok(match (regime, context) {
            (Regime::Full, _) => share,
            (Regime::Usufruct, Market) => {
                share * self.scale.usufruct_fraction(self.age(owner, year)?)
            }
            (Regime::Usufruct, WealthTax) => share,
            (Regime::Usufruct, Succession) => 0.0,
            (Regime::Bare, Market | Succession) => share * self.bare_fraction(ownership, year)?,
            (Regime::Bare, WealthTax) => 0.0,
        })
    }

    /// Value of `item` attributable to `owner`
    pub fn owned_value<T: Ownable + ?Sized>(
        &self,
        item: &T,
        owner: &str,
        year: i32,
        context: EvaluationContext,
    ) -> Result<f64, OwnershipError> {
        let ownership = item.ownership();
        if !ownership.has_owner(owner) {
            return Ok(0.0);
        }
        let mut weight = 0.0;
        for regime in [Regime::Full, Regime::Usufruct, Regime::Bare] {
            weight += self.regime_weight(ownership, owner, regime, year, context)?;
        }
        if weight == 0.0 {
            return Ok(0.0);
        }
        let discount = self.discounts.factor(
            item.discount_flags(year),
            ownership.is_undivided(),
            context,
        );
        Ok(weight * item.value(year)? * discount)
    }

    /// Sum of the values attributable to several owners
    pub fn group_value<T: Ownable + ?Sized>(
        &self,
        item: &T,
        owners: &[&str],
        year: i32,
        context: EvaluationContext,
    ) -> Result<f64, OwnershipError> {
        owners.iter().try_fold(0.0, |acc, owner| {
            Ok(acc + self.owned_value(item, owner, year, context)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patrimony::Owner;
    use approx::assert_abs_diff_eq;
    use std::collections::HashMap;

    struct Ages(HashMap<&'static str, u32>);

    impl AgeProvider for Ages {
        fn age_of(&self, name: &str, _year: i32) -> Option<u32> {
            self.0.get(name).copied()
        }
    }

    struct Item {
        ownership: Ownership,
        value: f64,
        primary_residence: bool,
    }

    impl Ownable for Item {
        fn name(&self) -> &str {
            "item"
        }
        fn ownership(&self) -> &Ownership {
            &self.ownership
        }
        fn ownership_mut(&mut self) -> &mut Ownership {
            &mut self.ownership
        }
        fn value(&self, _year: i32) -> Result<f64, FinanceError> {
            Ok(self.value)
        }
        fn discount_flags(&self, _year: i32) -> DiscountFlags {
            DiscountFlags {
                primary_residence: self.primary_residence,
                rented: false,
            }
        }
    }

    fn ages() -> Ages {
        Ages(HashMap::from([("U1", 65), ("U2", 45), ("B1", 35), ("B2", 30)]))
    }

    fn dismembered() -> Item {
        Item {
            ownership: Ownership::Dismembered {
                usufruct_owners: vec![Owner::new("U1", 0.6), Owner::new("U2", 0.4)],
                bare_owners: vec![Owner::new("B1", 0.5), Owner::new("B2", 0.5)],
            },
            value: 500_000.0,
            primary_residence: false,
        }
    }

    #[test]
    fn test_market_values_sum_to_item_value() {
        let scale = UsufructScale::default();
        let ages = ages();
        let discounts = ValuationDiscounts::default();
        let valuator = Valuator::new(&scale, &ages, &discounts);
        let item = dismembered();
        let owners = ["U1", "U2", "B1", "B2"];
        let total = valuator
            .group_value(&item, &owners, 2025, EvaluationContext::Market)
            .unwrap();
        assert_abs_diff_eq!(total, 500_000.0, epsilon = 1e-6);

        // 65 years old: usufruct worth 40%
        let u1 = valuator
            .owned_value(&item, "U1", 2025, EvaluationContext::Market)
            .unwrap();
        assert_abs_diff_eq!(u1, 0.6 * 0.4 * 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_wealth_tax_goes_to_usufructuaries() {
        let scale = UsufructScale::default();
        let ages = ages();
        let discounts = ValuationDiscounts::default();
        let valuator = Valuator::new(&scale, &ages, &discounts);
        let item = dismembered();
        let ctx = EvaluationContext::WealthTax;
        assert_abs_diff_eq!(valuator.owned_value(&item, "U1", 2025, ctx).unwrap(), 300_000.0);
        assert_eq!(valuator.owned_value(&item, "B1", 2025, ctx).unwrap(), 0.0);
    }

    #[test]
    fn test_succession_extinguishes_usufruct() {
        let scale = UsufructScale::default();
        let ages = ages();
        let discounts = ValuationDiscounts::default();
        let valuator = Valuator::new(&scale, &ages, &discounts);
        let item = dismembered();
        let ctx = EvaluationContext::Succession;
        assert_eq!(valuator.owned_value(&item, "U2", 2025, ctx).unwrap(), 0.0);
        // bare fraction = 0.6 × 0.6 + 0.4 × 0.4
        let b1 = valuator.owned_value(&item, "B1", 2025, ctx).unwrap();
        assert_abs_diff_eq!(b1, 0.5 * 0.52 * 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_discounts_never_apply_to_market_value() {
        let scale = UsufructScale::default();
        let ages = ages();
        let discounts = ValuationDiscounts::default();
        let valuator = Valuator::new(&scale, &ages, &discounts);
        let home = Item {
            ownership: Ownership::sole("U1"),
            value: 400_000.0,
            primary_residence: true,
        };
        let market = valuator
            .owned_value(&home, "U1", 2025, EvaluationContext::Market)
            .unwrap();
        let wealth = valuator
            .owned_value(&home, "U1", 2025, EvaluationContext::WealthTax)
            .unwrap();
        let succession = valuator
            .owned_value(&home, "U1", 2025, EvaluationContext::Succession)
            .unwrap();
        assert_abs_diff_eq!(market, 400_000.0);
        assert_abs_diff_eq!(wealth, 280_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(succession, 320_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unknown_usufructuary_age() {
        let scale = UsufructScale::default();
        let ages = Ages(HashMap::new());
        let discounts = ValuationDiscounts::default();
        let valuator = Valuator::new(&scale, &ages, &discounts);
        let item = dismembered();
        assert!(matches!(
            valuator.owned_value(&item, "B1", 2025, EvaluationContext::Market),
            Err(OwnershipError::UnknownAge(_))
        ));
    }
}
