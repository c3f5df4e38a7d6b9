//! Ownership of an asset or liability: full, or split into usufruct and
//! bare ownership

use super::finance_math::FinanceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance on the sum of the shares of a regime
pub const SHARE_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Error, PartialEq)]
pub enum OwnershipError {
    #[error("{item}: {regime:?} owners list is empty")]
    NoOwner { item: String, regime: Regime },
    #[error("{item}: {regime:?} shares sum to {sum} instead of 1")]
    SharesDoNotSumToOne { item: String, regime: Regime, sum: f64 },
    #[error("{item}: invalid share {fraction} for '{owner}'")]
    InvalidShare {
        item: String,
        owner: String,
        fraction: f64,
    },
    #[error("{item}: '{owner}' appears twice in the {regime:?} owners")]
    DuplicateOwner {
        item: String,
        owner: String,
        regime: Regime,
    },
    #[error("age of '{0}' is unknown")]
    UnknownAge(String),
    #[error("{item}: invalid life-insurance clause: {reason}")]
    InvalidClause { item: String, reason: String },
    #[error(transparent)]
    Schedule(#[from] FinanceError),
}

/// Right held on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Regime {
    Full,
    Usufruct,
    Bare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub fraction: f64,
}

impl Owner {
    pub fn new(name: impl Into<String>, fraction: f64) -> Self {
        Self {
            name: name.into(),
            fraction,
        }
    }
}

/// Who owns an item, and under which regime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "camelCase")]
pub enum Ownership {
    Full {
        owners: Vec<Owner>,
    },
    #[serde(rename_all = "camelCase")]
    Dismembered {
        usufruct_owners: Vec<Owner>,
        bare_owners: Vec<Owner>,
    },
}

/// How the decedent's rights on an item pass to the heirs
///
/// `full` fractions plus the total of the `usufruct` fractions sum to 1; the
/// `usufruct` and `bare` lists have the same total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Devolution {
    pub full: Vec<Owner>,
    pub usufruct: Vec<Owner>,
    pub bare: Vec<Owner>,
}

impl Devolution {
    pub fn in_full(owners: Vec<Owner>) -> Self {
        Self {
            full: owners,
            ..Self::default()
        }
    }

    /// Same devolution where the usufructuaries receive the dismembered part
    /// in full (quasi-usufruct of fungible assets)
    pub fn quasi_usufruct(&self) -> Self {
        let mut full = self.full.clone();
        for owner in &self.usufruct {
            add_share(&mut full, &owner.name, owner.fraction);
        }
        Self::in_full(full)
    }

    /// Fraction of the decedent's full share devolved in dismembered form
    pub fn dismembered_fraction(&self) -> f64 {
        self.usufruct.iter().map(|o| o.fraction).sum()
    }
}

fn add_share(owners: &mut Vec<Owner>, name: &str, fraction: f64) {
    if fraction <= 0.0 {
        return;
    }
    match owners.iter_mut().find(|o| o.name == name) {
        Some(owner) => owner.fraction += fraction,
        None => owners.push(Owner::new(name, fraction)),
    }
}

fn share_of(owners: &[Owner], name: &str) -> f64 {
    owners
        .iter()
        .filter(|o| o.name == name)
        .map(|o| o.fraction)
        .sum()
}

fn same_owners(a: &[Owner], b: &[Owner]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|o| (share_of(b, &o.name) - o.fraction).abs() < SHARE_TOLERANCE)
}

fn validate_regime(item: &str, regime: Regime, owners: &[Owner]) -> Result<(), OwnershipError> {
    if owners.is_empty() {
        return Err(OwnershipError::NoOwner {
            item: item.to_string(),
            regime,
        });
    }
    for (i, owner) in owners.iter().enumerate() {
        if !owner.fraction.is_finite()
            || owner.fraction <= 0.0
            || owner.fraction > 1.0 + SHARE_TOLERANCE
        {
            return Err(OwnershipError::InvalidShare {
                item: item.to_string(),
                owner: owner.name.clone(),
                fraction: owner.fraction,
            });
        }
        if owners[..i].iter().any(|o| o.name == owner.name) {
            return Err(OwnershipError::DuplicateOwner {
                item: item.to_string(),
                owner: owner.name.clone(),
                regime,
            });
        }
    }
    let sum: f64 = owners.iter().map(|o| o.fraction).sum();
    if (sum - 1.0).abs() > SHARE_TOLERANCE {
        return Err(OwnershipError::SharesDoNotSumToOne {
            item: item.to_string(),
            regime,
            sum,
        });
    }
    Ok(())
}

impl Ownership {
    /// Single owner in full ownership
    pub fn sole(name: impl Into<String>) -> Self {
        Ownership::Full {
            owners: vec![Owner::new(name, 1.0)],
        }
    }

    pub fn validate(&self, item: &str) -> Result<(), OwnershipError> {
        match self {
            Ownership::Full { owners } => validate_regime(item, Regime::Full, owners),
            Ownership::Dismembered {
                usufruct_owners,
                bare_owners,
            } => {
                validate_regime(item, Regime::Usufruct, usufruct_owners)?;
                validate_regime(item, Regime::Bare, bare_owners)
            }
        }
    }

    pub fn is_dismembered(&self) -> bool {
        matches!(self, Ownership::Dismembered { .. })
    }

    /// Share of `name` under `regime`
    pub fn share(&self, name: &str, regime: Regime) -> f64 {
        match (self, regime) {
            (Ownership::Full { owners }, Regime::Full) => share_of(owners, name),
            (Ownership::Dismembered { usufruct_owners, .. }, Regime::Usufruct) => {
                share_of(usufruct_owners, name)
            }
            (Ownership::Dismembered { bare_owners, .. }, Regime::Bare) => {
                share_of(bare_owners, name)
            }
            _ => 0.0,
        }
    }

    pub fn has_owner(&self, name: &str) -> bool {
        self.owner_names().any(|n| n == name)
    }

    pub fn owner_names(&self) -> impl Iterator<Item = &str> {
        let (first, second): (&[Owner], &[Owner]) = match self {
            Ownership::Full { owners } => (owners.as_slice(), [].as_slice()),
            Ownership::Dismembered {
                usufruct_owners,
                bare_owners,
            } => (usufruct_owners.as_slice(), bare_owners.as_slice()),
        };
        first.iter().chain(second.iter()).map(|o| o.name.as_str())
    }

    /// Share of the income (rents, interest) received by the given people
    pub fn income_share<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> f64 {
        names
            .into_iter()
            .map(|n| self.share(n, Regime::Full) + self.share(n, Regime::Usufruct))
            .sum()
    }

    /// Every right on the item belongs to the given people
    pub fn is_fully_owned_by(&self, names: &[&str]) -> bool {
        self.owner_names().all(|n| names.contains(&n))
    }

    /// Several owners hold the same regime
    pub fn is_undivided(&self) -> bool {
        match self {
            Ownership::Full { owners } => owners.len() > 1,
            Ownership::Dismembered {
                usufruct_owners,
                bare_owners,
            } => usufruct_owners.len() > 1 || bare_owners.len() > 1,
        }
    }

    /// Pass the rights of `decedent` to the heirs
    ///
    /// A usufruct held by the decedent is extinguished: it returns to the
    /// bare owners, or to the other usufructuaries when there are some. The
    /// decedent's full share then devolves per `devolution`, and a bare
    /// share devolves as bare ownership to the heirs who receive property
    /// (full or bare). When the result is dismembered, a full share kept by
    /// another owner is expressed as equal usufruct and bare shares.
    pub fn transfer(&mut self, decedent: &str, devolution: &Devolution) {
        let (mut usufruct, mut bare) = match self {
            Ownership::Full { owners } => (owners.clone(), owners.clone()),
            Ownership::Dismembered {
                usufruct_owners,
                bare_owners,
            } => (usufruct_owners.clone(), bare_owners.clone()),
        };
        let was_full = !self.is_dismembered();

        if was_full {
            // A full share is the union of equal usufruct and bare shares
            let share = share_of(&usufruct, decedent);
            usufruct.retain(|o| o.name != decedent);
            bare.retain(|o| o.name != decedent);
            for heir in &devolution.full {
                add_share(&mut usufruct, &heir.name, share * heir.fraction);
                add_share(&mut bare, &heir.name, share * heir.fraction);
            }
            for heir in &devolution.usufruct {
                add_share(&mut usufruct, &heir.name, share * heir.fraction);
            }
            for heir in &devolution.bare {
                add_share(&mut bare, &heir.name, share * heir.fraction);
            }
        } else {
            let usufruct_share = share_of(&usufruct, decedent);
            usufruct.retain(|o| o.name != decedent);
            if usufruct_share > 0.0 && !usufruct.is_empty() {
                let remaining: f64 = usufruct.iter().map(|o| o.fraction).sum();
                usufruct
                    .iter_mut()
                    .for_each(|o| o.fraction /= remaining);
            }

            let bare_share = share_of(&bare, decedent);
            bare.retain(|o| o.name != decedent);
            let receivers: Vec<&Owner> = devolution.full.iter().chain(&devolution.bare).collect();
            let total: f64 = receivers.iter().map(|o| o.fraction).sum();
            if total > 0.0 {
                for heir in receivers {
                    add_share(&mut bare, &heir.name, bare_share * heir.fraction / total);
                }
            }

            if usufruct.is_empty() {
                // Usufruct extinguished: bare owners now own in full
                *self = Ownership::Full { owners: bare };
                return;
            }
        }

        *self = if same_owners(&usufruct, &bare) {
            Ownership::Full { owners: bare }
        } else {
            Ownership::Dismembered {
                usufruct_owners: usufruct,
                bare_owners: bare,
            }
        };
    }
}
