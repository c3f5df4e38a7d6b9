//! CSV export of runs and batches
//!
//! Each table is written as flat rows; the named-value tables of a cash-flow
//! line are exported in long format (one row per item).

use crate::assumptions::{EconomyKey, SocioEconomyKey};
use crate::projection::{
    BalanceSheetLine, CashFlowLine, KpiKind, NamedValueTable, OwnerGroup, RunOutcome, RunResult,
    TerminationReason,
};
use crate::random::{Histogram, HistogramError};
use crate::scenario::SimulationResultTable;
use crate::succession::{Succession, SuccessionKind};
use csv::Writer;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Histogram(#[from] HistogramError),
}

#[derive(Debug, Serialize)]
struct CashFlowRow {
    year: i32,
    nb_adults: usize,
    revenues: f64,
    taxes: f64,
    expenses: f64,
    taxable_income: f64,
    net_cash_flow: f64,
    deposited: f64,
    withdrawn: f64,
    withheld_levies: f64,
    missing_cash: f64,
    flat_tax_base_next_year: f64,
    social_levies_base_next_year: f64,
}

impl From<&CashFlowLine> for CashFlowRow {
    fn from(line: &CashFlowLine) -> Self {
        Self {
            year: line.year,
            nb_adults: line.nb_adults,
            revenues: line.total_revenues(),
            taxes: line.total_taxes(),
            expenses: line.total_expenses(),
            taxable_income: line.taxable_income,
            net_cash_flow: line.net_cash_flow,
            deposited: line.deposited,
            withdrawn: line.withdrawn,
            withheld_levies: line.withheld_levies,
            missing_cash: line.missing_cash,
            flat_tax_base_next_year: line.delayed_out.flat_tax_base,
            social_levies_base_next_year: line.delayed_out.social_levies_base,
        }
    }
}

#[derive(Debug, Serialize)]
struct CashFlowItemRow<'a> {
    year: i32,
    category: &'static str,
    name: &'a str,
    value: f64,
}

#[derive(Debug, Serialize)]
struct BalanceSheetRow {
    year: i32,
    group: OwnerGroup,
    real_estate: f64,
    investments: f64,
    receivables: f64,
    loans: f64,
    debts: f64,
    net_worth: f64,
}

#[derive(Debug, Serialize)]
struct InheritanceRow<'a> {
    year: i32,
    kind: SuccessionKind,
    decedent: &'a str,
    heir: &'a str,
    percent: f64,
    brut: f64,
    tax: f64,
    net: f64,
    received_net_cash: f64,
    restitution_debt: f64,
}

#[derive(Debug, Serialize)]
struct ResultRow {
    run_number: u32,
    outcome: RunOutcome,
    termination: TerminationReason,
    final_year: i32,
    minimum_adults_asset: Option<f64>,
    asset_at_first_death: Option<f64>,
    asset_at_second_death: Option<f64>,
    inflation: Option<f64>,
    secured_rate: Option<f64>,
    stock_rate: Option<f64>,
    pension_devaluation_rate: Option<f64>,
    extra_quarters_to_full_pension: Option<f64>,
    expenses_under_evaluation_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
struct BucketRow {
    center: f64,
    count: usize,
    pdf: f64,
    cdf: f64,
}

pub fn write_cash_flows<W: Write>(writer: W, lines: &[CashFlowLine]) -> csv::Result<()> {
    let mut csv = Writer::from_writer(writer);
    for line in lines {
        csv.serialize(CashFlowRow::from(line))?;
    }
    csv.flush()?;
    Ok(())
}

/// Every revenue, tax and expense item, one row each
pub fn write_cash_flow_items<W: Write>(writer: W, lines: &[CashFlowLine]) -> csv::Result<()> {
    let mut csv = Writer::from_writer(writer);
    for line in lines {
        let tables: [(&'static str, &NamedValueTable); 3] = [
            ("revenue", &line.revenues),
            ("tax", &line.taxes),
            ("expense", &line.expenses),
        ];
        for (category, table) in tables {
            for item in &table.items {
                csv.serialize(CashFlowItemRow {
                    year: line.year,
                    category,
                    name: &item.name,
                    value: item.value,
                })?;
            }
        }
    }
    csv.flush()?;
    Ok(())
}

pub fn write_balance_sheets<W: Write>(writer: W, lines: &[BalanceSheetLine]) -> csv::Result<()> {
    let mut csv = Writer::from_writer(writer);
    for line in lines {
        for group in [OwnerGroup::Adults, OwnerGroup::Children] {
            let balance = line.group(group);
            csv.serialize(BalanceSheetRow {
                year: line.year,
                group,
                real_estate: balance.real_estate.total(),
                investments: balance.investments.total(),
                receivables: balance.receivables.total(),
                loans: balance.loans.total(),
                debts: balance.debts.total(),
                net_worth: balance.net_worth(),
            })?;
        }
    }
    csv.flush()?;
    Ok(())
}

pub fn write_successions<W: Write>(writer: W, successions: &[Succession]) -> csv::Result<()> {
    let mut csv = Writer::from_writer(writer);
    for succession in successions {
        for inheritance in &succession.inheritances {
            csv.serialize(InheritanceRow {
                year: succession.year,
                kind: succession.kind,
                decedent: &succession.decedent,
                heir: &inheritance.heir,
                percent: inheritance.percent,
                brut: inheritance.brut,
                tax: inheritance.tax,
                net: inheritance.net,
                received_net_cash: inheritance.received_net_cash,
                restitution_debt: inheritance.restitution_debt,
            })?;
        }
    }
    csv.flush()?;
    Ok(())
}

pub fn write_result_table<W: Write>(writer: W, table: &SimulationResultTable) -> csv::Result<()> {
    let mut csv = Writer::from_writer(writer);
    for line in &table.lines {
        let economy = &line.sampled.scenario.economy;
        let socio = &line.sampled.scenario.socio_economy;
        csv.serialize(ResultRow {
            run_number: line.run_number,
            outcome: line.outcome,
            termination: line.termination,
            final_year: line.final_year,
            minimum_adults_asset: line.kpi_value(KpiKind::MinimumAdultsAsset),
            asset_at_first_death: line.kpi_value(KpiKind::AssetAtFirstDeath),
            asset_at_second_death: line.kpi_value(KpiKind::AssetAtSecondDeath),
            inflation: economy.get(&EconomyKey::Inflation).copied(),
            secured_rate: economy.get(&EconomyKey::SecuredRate).copied(),
            stock_rate: economy.get(&EconomyKey::StockRate).copied(),
            pension_devaluation_rate: socio.get(&SocioEconomyKey::PensionDevaluationRate).copied(),
            extra_quarters_to_full_pension: socio
                .get(&SocioEconomyKey::ExtraQuartersToFullPension)
                .copied(),
            expenses_under_evaluation_rate: socio
                .get(&SocioEconomyKey::ExpensesUnderEvaluationRate)
                .copied(),
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// One row per bucket of a sorted histogram
pub fn write_distribution<W: Write>(writer: W, histogram: &Histogram) -> Result<(), ReportError> {
    let centers = histogram.x_values()?;
    let counts = histogram.counts()?;
    let pdf = histogram.pdf()?;
    let cdf = histogram.cdf()?;
    let mut csv = Writer::from_writer(writer);
    for (i, &center) in centers.iter().enumerate() {
        csv.serialize(BucketRow {
            center,
            count: counts[i],
            pdf: pdf[i],
            cdf: cdf[i],
        })?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the tables of one run into `dir`
pub fn write_run(dir: &Path, result: &RunResult) -> csv::Result<()> {
    fs::create_dir_all(dir)?;
    let file = |name: &str| fs::File::create(dir.join(name));
    write_cash_flows(file("cash_flows.csv")?, &result.cash_flows)?;
    write_cash_flow_items(file("cash_flow_items.csv")?, &result.cash_flows)?;
    write_balance_sheets(file("balance_sheets.csv")?, &result.balance_sheets)?;
    write_successions(file("successions.csv")?, &result.successions)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::GroupBalance;

    fn line() -> CashFlowLine {
        let mut line = CashFlowLine::new(2025);
        line.nb_adults = 2;
        line.revenues.add("Salary Paul", 40_000.0);
        line.taxes.add("Income tax", 3_000.0);
        line.expenses.add("Living expenses", 30_000.0);
        line.settle();
        line.deposited = line.net_cash_flow;
        line
    }

    #[test]
    fn test_cash_flow_rows() {
        let mut out = Vec::new();
        write_cash_flows(&mut out, &[line()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut rows = text.lines();
        assert!(rows.next().unwrap().starts_with("year,nb_adults,revenues"));
        assert!(rows.next().unwrap().starts_with("2025,2,40000.0,3000.0,30000.0"));
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_items_in_long_format() {
        let mut out = Vec::new();
        write_cash_flow_items(&mut out, &[line()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("2025,tax,Income tax,3000.0"));
    }

    #[test]
    fn test_distribution_rows() {
        let mut histogram = Histogram::new("MinimumAdultsAsset");
        histogram.record_all([0.0, 10.0, 10.0, 30.0]);
        histogram.sort(3).unwrap();
        let mut out = Vec::new();
        write_distribution(&mut out, &histogram).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "center,count,pdf,cdf");
        assert_eq!(rows.len(), 4);
        assert!(rows[1].starts_with("5.0,1,"));
        assert!(rows[3].ends_with(",1.0"));
    }

    #[test]
    fn test_distribution_needs_sorted_histogram() {
        let mut histogram = Histogram::new("h");
        histogram.record(1.0);
        let err = write_distribution(Vec::new(), &histogram).unwrap_err();
        assert!(matches!(err, ReportError::Histogram(_)));
    }

    #[test]
    fn test_balance_sheet_has_both_groups() {
        let mut adults = GroupBalance::default();
        adults.investments.add("Livret", 80_000.0);
        adults.loans.add("Mortgage", 20_000.0);
        let sheet = BalanceSheetLine {
            year: 2030,
            adults,
            children: GroupBalance::default(),
        };
        let mut out = Vec::new();
        write_balance_sheets(&mut out, &[sheet]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2030,Adults,0.0,80000.0,0.0,20000.0,0.0,60000.0"));
        assert!(text.contains("2030,Children,0.0,0.0,0.0,0.0,0.0,0.0"));
    }
}
