//! Core projection engine: the yearly cash-flow and balance-sheet loop of
//! one run

use super::balance_sheet::{BalanceSheetLine, OwnerGroup};
use super::cashflows::{CashFlowLine, DelayedTaxation};
use super::kpi::{KpiKind, KpiResults, RunOutcome, TerminationReason};
use super::state::LedgerState;
use crate::assumptions::{
    Assumptions, ScenarioError, ScenarioValues, SocioEconomyKey, SocioEconomyValues,
};
use crate::config::ModelConfig;
use crate::error::SimulationError;
use crate::family::{AdultProfile, Family, WorkIncome};
use crate::household::Household;
use crate::patrimony::{EvaluationContext, InvestmentKind, Patrimony, Valuator};
use crate::random::SimulationMode;
use crate::succession::{Succession, SuccessionManager};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cash shortfall tolerated before the run is declared out of cash
pub const CASH_TOLERANCE: f64 = 1.0;

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionConfig {
    pub first_year: i32,
    /// Last simulated year, included
    pub last_year: i32,
    pub mode: SimulationMode,
    /// Draw each year's rates around the run's means
    pub simulate_volatility: bool,
    /// Keep every cash-flow and balance-sheet line
    pub detailed_output: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            first_year: 2025,
            last_year: 2064,
            mode: SimulationMode::Deterministic,
            simulate_volatility: false,
            detailed_output: true,
        }
    }
}

impl ProjectionConfig {
    pub fn with_nb_years(first_year: i32, nb_years: u32) -> Self {
        Self {
            first_year,
            last_year: first_year + nb_years.max(1) as i32 - 1,
            ..Self::default()
        }
    }

    pub fn nb_years(&self) -> usize {
        (self.last_year - self.first_year + 1).max(0) as usize
    }
}

/// Inputs drawn for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledInputs {
    pub scenario: ScenarioValues,
    pub ages_of_death: BTreeMap<String, u32>,
    pub years_of_dependency: BTreeMap<String, u32>,
}

/// Everything a run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_number: u32,
    pub termination: TerminationReason,
    /// Year the run stopped in
    pub final_year: i32,
    pub sampled: SampledInputs,
    pub kpis: KpiResults,
    pub outcome: RunOutcome,
    pub successions: Vec<Succession>,
    /// Only kept with `detailed_output`
    pub cash_flows: Vec<CashFlowLine>,
    /// Only kept with `detailed_output`
    pub balance_sheets: Vec<BalanceSheetLine>,
    /// Adults' net worth at the end of each year
    pub net_worth_history: Vec<f64>,
}

/// Main projection engine
///
/// Owns its copy of the scenario generators; the fiscal model, valuation
/// discounts and KPI objectives are borrowed from the [`ModelConfig`].
pub struct ProjectionEngine<'a> {
    model: &'a ModelConfig,
    assumptions: Assumptions,
    config: ProjectionConfig,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(model: &'a ModelConfig, config: ProjectionConfig) -> Self {
        Self {
            model,
            assumptions: model.assumptions.clone(),
            config,
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    /// Run the household from `first_year` until a termination condition
    ///
    /// `household` must be a fresh copy: ownerships are transferred and
    /// accounts opened during the run.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        run_number: u32,
        household: &mut Household,
        rng: &mut R,
    ) -> Result<RunResult, SimulationError> {
        let ProjectionConfig {
            first_year,
            last_year,
            mode,
            simulate_volatility,
            ..
        } = self.config;

        let mut scenario =
            self.assumptions
                .next_run(mode, simulate_volatility, first_year, last_year, rng)?;
        // The engine's human-life history only holds this run's draws
        self.assumptions.human_life.reset_random_history();
        household.family.next_random_properties(
            &mut self.assumptions.human_life,
            mode,
            first_year,
            rng,
        );
        scenario.life = self.assumptions.human_life.life_draws();
        let sampled = sampled_inputs(scenario, &household.family);
        self.project(run_number, household, sampled)
    }

    /// Run the household again with the inputs recorded by an earlier run
    ///
    /// Nothing is drawn: the generators and the family members take the
    /// recorded values. Use [`SimulationMode::Random`] so that the recorded
    /// values are read instead of the defaults.
    pub fn replay(
        &mut self,
        run_number: u32,
        household: &mut Household,
        sampled: &SampledInputs,
    ) -> Result<RunResult, SimulationError> {
        let ProjectionConfig {
            first_year,
            last_year,
            ..
        } = self.config;
        if last_year < first_year {
            return Err(ScenarioError::OutOfBounds {
                year: last_year,
                first_year,
                last_year,
            }
            .into());
        }
        self.assumptions.set_random_values(&sampled.scenario);
        household
            .family
            .set_life_parameters(&sampled.ages_of_death, &sampled.years_of_dependency);
        self.project(run_number, household, sampled.clone())
    }

    fn project(
        &self,
        run_number: u32,
        household: &mut Household,
        sampled: SampledInputs,
    ) -> Result<RunResult, SimulationError> {
        let ProjectionConfig {
            first_year,
            last_year,
            detailed_output,
            ..
        } = self.config;
        household.patrimony.reset_states();
        household.validate()?;

        let mut result = RunResult {
            run_number,
            termination: TerminationReason::HorizonReached,
            final_year: first_year,
            sampled,
            kpis: KpiResults::default(),
            outcome: RunOutcome::SomeObjectiveUndefined,
            successions: Vec::new(),
            cash_flows: Vec::new(),
            balance_sheets: Vec::new(),
            net_worth_history: Vec::new(),
        };

        let mut state = LedgerState::new(first_year);
        for year in first_year..=last_year {
            state.year = year;
            result.final_year = year;
            if let Some(reason) = self.project_year(household, &mut state, &mut result)? {
                result.termination = reason;
                break;
            }
        }

        result.outcome = state.kpis.outcome(&self.model.kpis);
        result.kpis = state.kpis;
        result.net_worth_history = state.net_worth_history;
        if !detailed_output {
            result.cash_flows.clear();
            result.balance_sheets.clear();
        }
        info!(
            "run {} ended in {} ({:?}), {} succession(s), outcome {:?}",
            run_number,
            result.final_year,
            result.termination,
            result.successions.len(),
            result.outcome
        );
        Ok(result)
    }

    /// Simulate one year; returns the termination reason when the run stops
    fn project_year(
        &self,
        household: &mut Household,
        state: &mut LedgerState,
        result: &mut RunResult,
    ) -> Result<Option<TerminationReason>, SimulationError> {
        let year = state.year;
        let model = self.model;
        let Household { family, patrimony } = household;
        let family: &Family = family;

        let adults: Vec<&str> = family
            .adults()
            .filter(|p| p.is_alive(year))
            .map(|p| p.name.as_str())
            .collect();
        if adults.len() > 2 {
            return Err(SimulationError::ModelInvariant(format!(
                "{} adults alive in {}",
                adults.len(),
                year
            )));
        }
        if adults.is_empty() {
            state.record_minimum(&model.kpis)?;
            return Ok(Some(TerminationReason::NoAdultAlive));
        }
        let valuator = Valuator::new(&model.fiscal.usufruct_scale, family, &model.valuation);

        // Cash flows
        let mut line = self.cash_flow_line(year, family, patrimony, &adults, state, &valuator)?;
        let mut delayed = DelayedTaxation::default();
        let net = line.net_cash_flow;
        if net >= 0.0 {
            patrimony.deposit(net, &adults);
            line.deposited = net;
        } else {
            let withdrawal =
                patrimony.withdraw(-net, &adults, &model.fiscal.financial_revenue_levies);
            line.withdrawn = withdrawal.obtained;
            line.withheld_levies = withdrawal.withheld_levies;
            delayed.add(withdrawal.flat_tax_base, withdrawal.social_levies_base);
            if withdrawal.missing > CASH_TOLERANCE {
                line.missing_cash = withdrawal.missing;
                line.delayed_out = delayed;
                result.cash_flows.push(line);
                info!(
                    "{}: insufficient cash, {:.0} missing, run stopped",
                    year, withdrawal.missing
                );
                state.record_minimum_on_ruin(&model.kpis)?;
                return Ok(Some(TerminationReason::InsufficientCash));
            }
        }

        // Capitalization
        let rates = self.assumptions.economy.rates(year, self.config.mode)?;
        let inflation = self.assumptions.economy.inflation(self.config.mode)?;
        for investment in &mut patrimony.investments {
            let interest = investment.capitalize(rates, inflation);
            if matches!(investment.kind, InvestmentKind::Other) && interest > 0.0 {
                let taxed = interest * investment.ownership.income_share(adults.iter().copied());
                delayed.add(taxed, taxed);
            }
        }
        line.delayed_out = delayed;
        state.delayed = delayed;
        result.cash_flows.push(line);

        // Deaths
        let alive_at_start = adults.len();
        let alive_at_end = family.nb_adults_alive_at_end_of(year);
        let mut worth_before_last_death = None;
        if alive_at_end < alive_at_start {
            let before = patrimony.net_worth(&adults, year, EvaluationContext::Market, &valuator)?;
            let manager = SuccessionManager::new(&model.fiscal, &model.valuation);
            for decedent in family.adults_dying_in(year) {
                let successions = manager.process(&decedent.name, year, family, patrimony)?;
                result.successions.extend(successions);
            }
            let survivors = OwnerGroup::Adults.members(family, year);
            let after =
                patrimony.net_worth(&survivors, year, EvaluationContext::Market, &valuator)?;
            record_death_kpis(alive_at_start, alive_at_end, before, after, state, model)?;
            if alive_at_end == 0 {
                worth_before_last_death = Some(before);
            }
        }

        // Balance sheet
        let balance = BalanceSheetLine::build(year, family, patrimony, &valuator)?;
        let net_worth =
            worth_before_last_death.unwrap_or_else(|| balance.net_worth(OwnerGroup::Adults));
        state.net_worth_history.push(net_worth);
        debug!(
            "{}: adults' net worth {:.0}, children's {:.0}",
            year,
            net_worth,
            balance.net_worth(OwnerGroup::Children)
        );
        result.balance_sheets.push(balance);

        if alive_at_end == 0 {
            state.record_minimum(&model.kpis)?;
            return Ok(Some(TerminationReason::NoAdultAlive));
        }
        if year >= self.config.last_year {
            state.record_minimum(&model.kpis)?;
            return Ok(Some(TerminationReason::HorizonReached));
        }
        Ok(None)
    }

    /// Gross pension of `year`, after the decote and the devaluation since
    /// the start of the simulation
    fn pension(&self, profile: &AdultProfile, year: i32, socio: &SocioEconomyValues) -> f64 {
        let socio_model = &self.assumptions.socio_economy;
        let extra_quarters = socio[&SocioEconomyKey::ExtraQuartersToFullPension];
        let devaluation = socio[&SocioEconomyKey::PensionDevaluationRate];
        let decote = socio_model.pension_decote(profile.missing_quarters + extra_quarters);
        let elapsed = (year - self.config.first_year).max(0);
        profile.pension * (1.0 - decote) * (1.0 - devaluation).powi(elapsed)
    }

    /// Revenues, taxes and expenses of the adults alive in `year`
    fn cash_flow_line(
        &self,
        year: i32,
        family: &Family,
        patrimony: &Patrimony,
        adults: &[&str],
        state: &LedgerState,
        valuator: &Valuator,
    ) -> Result<CashFlowLine, SimulationError> {
        let fiscal = &self.model.fiscal;
        let socio = self
            .assumptions
            .socio_economy
            .current_values(self.config.mode)?;
        let mut line = CashFlowLine::new(year);
        line.nb_adults = adults.len();
        line.delayed_in = state.delayed;
        let mut taxable = 0.0;

        // Work income and pensions
        for person in family.adults().filter(|p| p.is_alive(year)) {
            let Some(profile) = person.adult_profile() else {
                continue;
            };
            if !person.is_retired(year) {
                match profile.work_income {
                    Some(WorkIncome::Salary { net_annual }) => {
                        line.revenues.add(format!("Salary {}", person.name), net_annual);
                        taxable += fiscal.income_tax.salary_taxable(net_annual);
                    }
                    Some(WorkIncome::Turnover { annual_turnover }) => {
                        line.revenues
                            .add(format!("Turnover {}", person.name), annual_turnover);
                        line.taxes.add(
                            format!("Turnover levies {}", person.name),
                            fiscal.turnover_levies.levy(annual_turnover),
                        );
                        taxable += fiscal.income_tax.turnover_taxable(annual_turnover);
                    }
                    None => {}
                }
            } else if profile.pension > 0.0 {
                let gross = self.pension(profile, year, &socio);
                line.revenues.add(format!("Pension {}", person.name), gross);
                line.taxes.add(
                    format!("Pension levies {}", person.name),
                    fiscal.pension_levies.levy(gross),
                );
                taxable += fiscal
                    .income_tax
                    .pension_taxable(fiscal.pension_levies.net(gross));
            }
        }

        // Real estate
        for estate in &patrimony.real_estates {
            let share = estate.ownership.income_share(adults.iter().copied());
            if share <= 0.0 {
                continue;
            }
            let rent = estate.rent(year) * share;
            if rent > 0.0 {
                line.revenues.add(format!("Rent {}", estate.name), rent);
                let taxable_rent = fiscal.income_tax.rent_taxable(rent);
                taxable += taxable_rent;
                line.taxes.add(
                    format!("Social levies on rent {}", estate.name),
                    fiscal.financial_revenue_levies.levy(taxable_rent),
                );
            }
            line.taxes
                .add(format!("Local tax {}", estate.name), estate.local_tax(year) * share);
            if let Some((price, gains_tax)) =
                estate.sale(year, &fiscal.real_estate_capital_gains)?
            {
                line.revenues.add(format!("Sale {}", estate.name), price * share);
                line.taxes.add(
                    format!("Capital gains tax {}", estate.name),
                    gains_tax.total() * share,
                );
            }
        }

        // Financial gains realized last year
        line.taxes
            .add("Flat tax", fiscal.flat_tax.levy(state.delayed.flat_tax_base));
        line.taxes.add(
            "Social levies on financial revenue",
            fiscal
                .financial_revenue_levies
                .levy(state.delayed.social_levies_base),
        );

        let income_tax =
            fiscal
                .income_tax
                .irpp(taxable, adults.len(), family.nb_fiscal_children(year));
        line.taxable_income = income_tax.taxable_income;
        line.taxes.add("Income tax", income_tax.amount);

        let wealth_tax_base =
            patrimony.net_worth(adults, year, EvaluationContext::WealthTax, valuator)?;
        line.taxes
            .add("Wealth tax", fiscal.wealth_tax.tax(wealth_tax_base.max(0.0)));

        // Expenses
        let under_evaluation = socio[&SocioEconomyKey::ExpensesUnderEvaluationRate];
        line.expenses.add(
            "Living expenses",
            family
                .expenses
                .annual_amount(family.expense_headcount(year), under_evaluation),
        );
        for loan in &patrimony.loans {
            let share = loan.ownership.income_share(adults.iter().copied());
            line.expenses
                .add(format!("Loan {}", loan.name), loan.annual_payment(year)? * share);
        }
        for debt in &patrimony.debts {
            let share = debt.ownership.income_share(adults.iter().copied());
            line.expenses
                .add(format!("Debt {}", debt.name), debt.annual_payment(year) * share);
        }

        line.settle();
        Ok(line)
    }
}

fn sampled_inputs(scenario: ScenarioValues, family: &Family) -> SampledInputs {
    SampledInputs {
        scenario,
        ages_of_death: family
            .members
            .iter()
            .map(|p| (p.name.clone(), p.age_of_death))
            .collect(),
        years_of_dependency: family
            .adults()
            .filter_map(|p| {
                p.adult_profile()
                    .map(|a| (p.name.clone(), a.nb_of_years_of_dependency))
            })
            .collect(),
    }
}

/// Net worth KPIs when the number of living adults drops
///
/// The first death is measured after transmission, on the survivor; the
/// last one before transmission.
fn record_death_kpis(
    alive_at_start: usize,
    alive_at_end: usize,
    before: f64,
    after: f64,
    state: &mut LedgerState,
    model: &ModelConfig,
) -> Result<(), SimulationError> {
    let kpis = &model.kpis;
    match (alive_at_start, alive_at_end) {
        (2, 1) => {
            state.kpis.record(KpiKind::AssetAtFirstDeath, after, kpis)?;
        }
        (2, 0) => {
            state.kpis.record(KpiKind::AssetAtFirstDeath, before, kpis)?;
            state.kpis.record(KpiKind::AssetAtSecondDeath, before, kpis)?;
        }
        (1, 0) => {
            // Single adult from the start: the only death is also the first
            if !state.kpis.contains(KpiKind::AssetAtFirstDeath) {
                state.kpis.record(KpiKind::AssetAtFirstDeath, before, kpis)?;
            }
            state.kpis.record(KpiKind::AssetAtSecondDeath, before, kpis)?;
        }
        (start, end) => {
            return Err(SimulationError::ModelInvariant(format!(
                "living adults went from {} to {}",
                start, end
            )));
        }
    }
    Ok(())
}
