//! Result table of a Monte-Carlo batch and its KPI statistics

use crate::projection::{
    KpiDefinition, KpiKind, KpiResults, KpiSet, RunOutcome, RunResult, SampledInputs,
    TerminationReason,
};
use crate::random::{Histogram, HistogramError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One run of the batch, without its yearly lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResultLine {
    pub run_number: u32,
    pub outcome: RunOutcome,
    pub termination: TerminationReason,
    pub final_year: i32,
    pub kpis: KpiResults,
    pub sampled: SampledInputs,
}

impl From<RunResult> for SimulationResultLine {
    fn from(result: RunResult) -> Self {
        Self {
            run_number: result.run_number,
            outcome: result.outcome,
            termination: result.termination,
            final_year: result.final_year,
            kpis: result.kpis,
            sampled: result.sampled,
        }
    }
}

impl SimulationResultLine {
    pub fn kpi_value(&self, kind: KpiKind) -> Option<f64> {
        self.kpis.get(kind).map(|r| r.value)
    }
}

/// Number of runs per outcome class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeCounts {
    pub some_objective_missed: usize,
    pub some_objective_undefined: usize,
    pub all_objectives_reached: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.some_objective_missed + self.some_objective_undefined + self.all_objectives_reached
    }
}

/// Distribution of one KPI over the batch, checked against its objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiStatistics {
    pub definition: KpiDefinition,
    /// Runs where the KPI was recorded
    pub nb_defined: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    /// Fraction of the defined runs reaching the objective
    pub reached_fraction: f64,
    /// Value reached or exceeded with the objective's probability
    pub value_at_probability: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResultTable {
    pub lines: Vec<SimulationResultLine>,
}

impl FromIterator<SimulationResultLine> for SimulationResultTable {
    fn from_iter<I: IntoIterator<Item = SimulationResultLine>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

impl SimulationResultTable {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, run_number: u32) -> Option<&SimulationResultLine> {
        self.lines.iter().find(|l| l.run_number == run_number)
    }

    pub fn sort_by_run_number(&mut self) {
        self.lines.sort_by_key(|l| l.run_number);
    }

    /// Sort by increasing KPI value; runs without the KPI come last
    pub fn sort_by_kpi(&mut self, kind: KpiKind) {
        self.lines
            .sort_by(|a, b| match (a.kpi_value(kind), b.kpi_value(kind)) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
    }

    pub fn filter(&self, outcome: RunOutcome) -> impl Iterator<Item = &SimulationResultLine> {
        self.lines.iter().filter(move |l| l.outcome == outcome)
    }

    pub fn outcome_counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for line in &self.lines {
            match line.outcome {
                RunOutcome::SomeObjectiveMissed => counts.some_objective_missed += 1,
                RunOutcome::SomeObjectiveUndefined => counts.some_objective_undefined += 1,
                RunOutcome::AllObjectivesReached => counts.all_objectives_reached += 1,
            }
        }
        counts
    }

    /// Histogram of the recorded values of one KPI, sorted in `bucket_count`
    /// buckets
    pub fn kpi_histogram(
        &self,
        kind: KpiKind,
        bucket_count: usize,
    ) -> Result<Histogram, HistogramError> {
        let mut histogram = Histogram::new(format!("{:?}", kind));
        histogram.record_all(self.lines.iter().filter_map(|l| l.kpi_value(kind)));
        histogram.sort(bucket_count)?;
        Ok(histogram)
    }

    /// Statistics of every KPI of `set` recorded in at least one run
    pub fn kpi_statistics(
        &self,
        set: &KpiSet,
        bucket_count: usize,
    ) -> Result<Vec<KpiStatistics>, HistogramError> {
        let mut statistics = Vec::new();
        for definition in &set.definitions {
            let values: Vec<_> = self
                .lines
                .iter()
                .filter_map(|l| l.kpis.get(definition.kind))
                .collect();
            if values.is_empty() {
                continue;
            }
            let histogram = self.kpi_histogram(definition.kind, bucket_count)?;
            let reached = values.iter().filter(|r| r.objective_reached).count();
            let reached_fraction = reached as f64 / values.len() as f64;
            statistics.push(KpiStatistics {
                definition: *definition,
                nb_defined: values.len(),
                min: histogram.min().unwrap_or_default(),
                max: histogram.max().unwrap_or_default(),
                average: histogram.average().unwrap_or_default(),
                reached_fraction,
                value_at_probability: histogram.percentile(definition.probability_objective)?,
                passed: reached_fraction >= definition.probability_objective,
            });
        }
        Ok(statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(run_number: u32, minimum: Option<f64>, set: &KpiSet) -> SimulationResultLine {
        let mut kpis = KpiResults::default();
        if let Some(value) = minimum {
            kpis.record(KpiKind::MinimumAdultsAsset, value, set).unwrap();
        }
        SimulationResultLine {
            run_number,
            outcome: kpis.outcome(set),
            termination: TerminationReason::HorizonReached,
            final_year: 2064,
            kpis,
            sampled: SampledInputs::default(),
        }
    }

    fn minimum_only() -> KpiSet {
        KpiSet {
            definitions: vec![KpiDefinition {
                kind: KpiKind::MinimumAdultsAsset,
                objective: 0.0,
                probability_objective: 0.9,
            }],
        }
    }

    #[test]
    fn test_sort_by_kpi_puts_undefined_last() {
        let set = minimum_only();
        let mut table: SimulationResultTable = [
            line(0, Some(30.0), &set),
            line(1, None, &set),
            line(2, Some(-5.0), &set),
        ]
        .into_iter()
        .collect();
        table.sort_by_kpi(KpiKind::MinimumAdultsAsset);
        let order: Vec<_> = table.lines.iter().map(|l| l.run_number).collect();
        assert_eq!(order, vec![2, 0, 1]);

        table.sort_by_run_number();
        assert_eq!(table.lines[0].run_number, 0);
    }

    #[test]
    fn test_outcome_counts_and_filter() {
        let set = minimum_only();
        let table: SimulationResultTable = [
            line(0, Some(10.0), &set),
            line(1, Some(-1.0), &set),
            line(2, None, &set),
            line(3, Some(4.0), &set),
        ]
        .into_iter()
        .collect();
        let counts = table.outcome_counts();
        assert_eq!(counts.all_objectives_reached, 2);
        assert_eq!(counts.some_objective_missed, 1);
        assert_eq!(counts.some_objective_undefined, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(table.filter(RunOutcome::SomeObjectiveMissed).count(), 1);
    }

    #[test]
    fn test_kpi_statistics() {
        let set = minimum_only();
        // 95 runs above the objective, 5 below
        let table: SimulationResultTable = (0..100)
            .map(|i| {
                let value = if i < 5 { -100.0 } else { 1_000.0 + i as f64 };
                line(i, Some(value), &set)
            })
            .collect();
        let statistics = table.kpi_statistics(&set, 20).unwrap();
        assert_eq!(statistics.len(), 1);
        let minimum = &statistics[0];
        assert_eq!(minimum.nb_defined, 100);
        assert_relative_eq!(minimum.reached_fraction, 0.95);
        assert!(minimum.passed);
        assert_eq!(minimum.min, -100.0);
        assert!(minimum.value_at_probability > minimum.definition.objective);
    }

    #[test]
    fn test_statistics_skip_undefined_kpis() {
        let set = KpiSet::default();
        let table: SimulationResultTable = [line(0, Some(1.0), &set)].into_iter().collect();
        let statistics = table.kpi_statistics(&set, 10).unwrap();
        assert_eq!(statistics.len(), 1);
        assert_eq!(statistics[0].definition.kind, KpiKind::MinimumAdultsAsset);
    }
}
