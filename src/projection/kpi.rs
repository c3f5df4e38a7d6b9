//! Key performance indicators of a run and their objectives

use crate::error::SimulationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KpiKind {
    /// Lowest net worth of the adults over the run
    MinimumAdultsAsset,
    /// Net worth of the survivor right after the first transmission
    AssetAtFirstDeath,
    /// Net worth of the last adult right before the last transmission
    AssetAtSecondDeath,
}

impl KpiKind {
    pub const ALL: [KpiKind; 3] = [
        KpiKind::MinimumAdultsAsset,
        KpiKind::AssetAtFirstDeath,
        KpiKind::AssetAtSecondDeath,
    ];
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
    HorizonReached,
    InsufficientCash,
    NoAdultAlive,
}

/// Objective of one KPI: `value ≥ objective` with at least
/// `probability_objective` of the runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDefinition {
    pub kind: KpiKind,
    pub objective: f64,
    pub probability_objective: f64,
}

impl KpiDefinition {
    pub fn is_reached(&self, value: f64) -> bool {
        value >= self.objective
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSet {
    pub definitions: Vec<KpiDefinition>,
}

impl Default for KpiSet {
    fn default() -> Self {
        Self {
            definitions: KpiKind::ALL
                .iter()
                .map(|&kind| KpiDefinition {
                    kind,
                    objective: 0.0,
                    probability_objective: 0.95,
                })
                .collect(),
        }
    }
}

impl KpiSet {
    pub fn definition(&self, kind: KpiKind) -> Option<&KpiDefinition> {
        self.definitions.iter().find(|d| d.kind == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = KpiKind> + '_ {
        self.definitions.iter().map(|d| d.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiResult {
    pub value: f64,
    pub objective_reached: bool,
}

/// Outcome class of a run, by decreasing severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunOutcome {
    SomeObjectiveMissed,
    SomeObjectiveUndefined,
    AllObjectivesReached,
}

/// KPI values of one run, each recorded at most once
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiResults(BTreeMap<KpiKind, KpiResult>);

impl KpiResults {
    pub fn record(
        &mut self,
        kind: KpiKind,
        value: f64,
        set: &KpiSet,
    ) -> Result<KpiResult, SimulationError> {
        if self.0.contains_key(&kind) {
            return Err(SimulationError::ModelInvariant(format!(
                "KPI {:?} recorded twice in the same run",
                kind
            )));
        }
        let result = KpiResult {
            value,
            objective_reached: set.definition(kind).map_or(true, |d| d.is_reached(value)),
        };
        self.0.insert(kind, result);
        Ok(result)
    }

    pub fn get(&self, kind: KpiKind) -> Option<&KpiResult> {
        self.0.get(&kind)
    }

    pub fn contains(&self, kind: KpiKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KpiKind, &KpiResult)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Classify the run against every KPI of `set`
    pub fn outcome(&self, set: &KpiSet) -> RunOutcome {
        let mut undefined = false;
        for kind in set.kinds() {
            match self.get(kind) {
                Some(result) if !result.objective_reached => {
                    return RunOutcome::SomeObjectiveMissed;
                }
                Some(_) => {}
                None => undefined = true,
            }
        }
        if undefined {
            RunOutcome::SomeObjectiveUndefined
        } else {
            RunOutcome::AllObjectivesReached
        }
    }
}
