//! Yearly ledger of a household: cash flows, balance sheets and KPIs

mod balance_sheet;
mod cashflows;
mod engine;
mod kpi;
mod state;

pub use balance_sheet::{BalanceSheetLine, GroupBalance, OwnerGroup};
pub use cashflows::{CashFlowLine, DelayedTaxation, NamedValue, NamedValueTable};
pub use engine::{ProjectionConfig, ProjectionEngine, RunResult, SampledInputs, CASH_TOLERANCE};
pub use kpi::{
    KpiDefinition, KpiKind, KpiResult, KpiResults, KpiSet, RunOutcome, TerminationReason,
};
pub use state::LedgerState;
