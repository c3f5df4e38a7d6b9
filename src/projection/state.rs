//! State carried from one simulated year to the next

use super::cashflows::DelayedTaxation;
use super::kpi::{KpiKind, KpiResults, KpiSet};
use crate::error::SimulationError;

#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    /// Year being simulated
    pub year: i32,
    /// Gains realized last year, taxed this year
    pub delayed: DelayedTaxation,
    /// Net worth of the adults at the end of each simulated year
    pub net_worth_history: Vec<f64>,
    pub kpis: KpiResults,
}

impl LedgerState {
    pub fn new(first_year: i32) -> Self {
        Self {
            year: first_year,
            ..Self::default()
        }
    }

    pub fn minimum_net_worth(&self) -> Option<f64> {
        self.net_worth_history.iter().copied().reduce(f64::min)
    }

    /// Minimum over the run when it ends normally
    pub fn record_minimum(&mut self, set: &KpiSet) -> Result<(), SimulationError> {
        if let Some(min) = self.minimum_net_worth() {
            self.kpis.record(KpiKind::MinimumAdultsAsset, min, set)?;
        }
        Ok(())
    }

    /// Minimum when cash runs out: never above zero
    pub fn record_minimum_on_ruin(&mut self, set: &KpiSet) -> Result<(), SimulationError> {
        let min = self.minimum_net_worth().map_or(0.0, |m| m.min(0.0));
        self.kpis.record(KpiKind::MinimumAdultsAsset, min, set)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_on_ruin_without_history() {
        let set = KpiSet::default();
        let mut state = LedgerState::new(2025);
        state.record_minimum_on_ruin(&set).unwrap();
        let min = state.kpis.get(KpiKind::MinimumAdultsAsset).unwrap();
        assert_eq!(min.value, 0.0);
        assert!(min.objective_reached);
    }

    #[test]
    fn test_minimum_over_history() {
        let set = KpiSet::default();
        let mut state = LedgerState::new(2025);
        state.net_worth_history = vec![100.0, 80.0, 120.0];
        state.record_minimum(&set).unwrap();
        assert_eq!(
            state.kpis.get(KpiKind::MinimumAdultsAsset).unwrap().value,
            80.0
        );
    }
}
