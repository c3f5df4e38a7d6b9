//! Patrimony Sim CLI
//!
//! Command-line interface for deterministic runs, Monte-Carlo batches and
//! replays of a single batch run

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use patrimony_sim::household::DEFAULT_HOUSEHOLD_PATH;
use patrimony_sim::projection::{KpiKind, RunResult};
use patrimony_sim::report;
use patrimony_sim::{
    Household, ModelConfig, MonteCarloConfig, ProjectionConfig, ScenarioRunner, SimulationMode,
    SimulationResultTable,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "patrimony_sim", version, about = "Household wealth projection")]
struct Cli {
    /// Household description (JSON)
    #[arg(long, default_value = DEFAULT_HOUSEHOLD_PATH)]
    household: PathBuf,

    /// Model directory or single JSON document; built-in defaults if absent
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory receiving the CSV tables
    #[arg(long, default_value = "output")]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Horizon {
    #[arg(long, default_value_t = 2025)]
    first_year: i32,

    /// Last simulated year, included
    #[arg(long, default_value_t = 2064)]
    last_year: i32,
}

#[derive(Debug, Args)]
struct Batch {
    #[command(flatten)]
    horizon: Horizon,

    #[arg(long, default_value_t = 1_000)]
    runs: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Keep each run's mean rates every year
    #[arg(long)]
    no_volatility: bool,

    #[arg(long, default_value_t = 50)]
    buckets: usize,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One run with every random variable at its default value
    Deterministic(Horizon),
    /// Parallel random runs and their KPI statistics
    MonteCarlo(Batch),
    /// Run one batch run again with every yearly line
    Replay {
        #[command(flatten)]
        batch: Batch,
        #[arg(long)]
        run: u32,
        /// Result table (JSON) of the batch: replay from its recorded inputs
        /// instead of the seed
        #[arg(long)]
        results: Option<PathBuf>,
    },
}

impl Batch {
    fn config(&self) -> MonteCarloConfig {
        MonteCarloConfig {
            nb_runs: self.runs,
            seed: self.seed,
            projection: ProjectionConfig {
                first_year: self.horizon.first_year,
                last_year: self.horizon.last_year,
                mode: SimulationMode::Random,
                simulate_volatility: !self.no_volatility,
                detailed_output: false,
            },
            bucket_count: self.buckets,
        }
    }
}

fn load_model(path: Option<&Path>) -> Result<ModelConfig> {
    match path {
        Some(path) => ModelConfig::load(path)
            .with_context(|| format!("loading model from {}", path.display())),
        None => Ok(ModelConfig::default()),
    }
}

fn print_run(result: &RunResult) {
    println!(
        "Run {}: stopped in {} ({:?}), outcome {:?}",
        result.run_number, result.final_year, result.termination, result.outcome
    );
    for kind in KpiKind::ALL {
        match result.kpis.get(kind) {
            Some(kpi) => println!(
                "  {:<20} {:>14.0} {}",
                format!("{:?}", kind),
                kpi.value,
                if kpi.objective_reached { "reached" } else { "missed" }
            ),
            None => println!("  {:<20} {:>14}", format!("{:?}", kind), "undefined"),
        }
    }
    for succession in &result.successions {
        println!(
            "  {} {:?} succession of {}: taxable {:.0}, tax {:.0}",
            succession.year,
            succession.kind,
            succession.decedent,
            succession.taxable_value,
            succession.total_tax()
        );
    }
}

fn write_run(output: &Path, result: &RunResult) -> Result<()> {
    report::write_run(output, result)
        .with_context(|| format!("writing run tables to {}", output.display()))?;
    println!("Tables written to {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    let household = Household::load(&cli.household)
        .with_context(|| format!("loading household from {}", cli.household.display()))?;
    household.validate()?;
    let model = load_model(cli.model.as_deref())?;
    let mut runner = ScenarioRunner::new(model, &household);

    match &cli.command {
        Command::Deterministic(horizon) => {
            let config = ProjectionConfig {
                first_year: horizon.first_year,
                last_year: horizon.last_year,
                ..ProjectionConfig::default()
            };
            let result = runner.run_deterministic(config)?;
            print_run(&result);
            write_run(&cli.output, &result)?;
        }
        Command::MonteCarlo(batch) => {
            let config = batch.config();
            let table = runner.run_monte_carlo(&config)?;
            let counts = table.outcome_counts();
            println!(
                "{} runs: {} all reached, {} some undefined, {} some missed",
                table.len(),
                counts.all_objectives_reached,
                counts.some_objective_undefined,
                counts.some_objective_missed
            );
            for stats in table.kpi_statistics(&runner.model().kpis, config.bucket_count)? {
                println!(
                    "  {:<20} avg {:>12.0}  at {:.0}%: {:>12.0}  objective {:.0}: {}",
                    format!("{:?}", stats.definition.kind),
                    stats.average,
                    stats.definition.probability_objective * 100.0,
                    stats.value_at_probability,
                    stats.definition.objective,
                    if stats.passed { "passed" } else { "failed" }
                );
            }
            std::fs::create_dir_all(&cli.output)?;
            let path = cli.output.join("results.csv");
            let file = File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            report::write_result_table(file, &table)?;
            let json_path = cli.output.join("results.json");
            let json = File::create(&json_path)
                .with_context(|| format!("creating {}", json_path.display()))?;
            serde_json::to_writer(json, &table)?;
            for stats in table.kpi_statistics(&runner.model().kpis, config.bucket_count)? {
                let kind = stats.definition.kind;
                let histogram = table.kpi_histogram(kind, config.bucket_count)?;
                let kpi_path = cli.output.join(format!("kpi_{:?}.csv", kind));
                let file = File::create(&kpi_path)
                    .with_context(|| format!("creating {}", kpi_path.display()))?;
                report::write_distribution(file, &histogram)?;
            }
            println!(
                "Result table written to {} and {}",
                path.display(),
                json_path.display()
            );
        }
        Command::Replay {
            batch,
            run,
            results,
        } => {
            let config = batch.config();
            let result = match results {
                Some(path) => {
                    let file = File::open(path)
                        .with_context(|| format!("opening {}", path.display()))?;
                    let table: SimulationResultTable = serde_json::from_reader(file)
                        .with_context(|| format!("reading {}", path.display()))?;
                    let line = table
                        .line(*run)
                        .with_context(|| format!("no run {} in {}", run, path.display()))?;
                    runner.replay_line(&config.projection, line)?
                }
                None => runner.replay_run(&config, *run)?,
            };
            print_run(&result);
            write_run(&cli.output.join(format!("run_{}", run)), &result)?;
        }
    }

    info!("done in {:?}", start.elapsed());
    Ok(())
}
