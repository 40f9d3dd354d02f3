//! Batch driver: loads policies, assumptions, and scenarios from local CSV
//! files and runs a full valuation, printing the result as JSON.

use anyhow::Context;
use clap::Parser;
use livecalc::assumptions::Assumptions;
use livecalc::error::LiveCalcError;
use livecalc::policy::load_policies;
use livecalc::scenario::{GbmParams, ScenarioGenerator};
use livecalc::valuation::{self, ValuationConfig};
use livecalc::AssumptionMultipliers;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "livecalc", version, about = "Nested-stochastic valuation batch driver")]
struct Cli {
    /// CSV of in-force policies.
    #[arg(long)]
    policies: PathBuf,

    /// Directory containing mortality.csv, lapse.csv, expenses.csv.
    #[arg(long)]
    assumptions: PathBuf,

    /// Number of stochastic scenarios to generate.
    #[arg(long, default_value_t = 1000)]
    scenarios: usize,

    /// RNG seed for the scenario generator.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Initial short rate for the scenario generator.
    #[arg(long, default_value_t = 0.03)]
    initial_rate: f64,

    /// Annualized drift of the short rate.
    #[arg(long, default_value_t = 0.0)]
    drift: f64,

    /// Annualized volatility of the short rate.
    #[arg(long, default_value_t = 0.01)]
    volatility: f64,

    /// Lower reflecting bound on the short rate.
    #[arg(long, default_value_t = 0.0)]
    rate_min: f64,

    /// Upper reflecting bound on the short rate.
    #[arg(long, default_value_t = 0.20)]
    rate_max: f64,

    /// Mortality multiplier applied to the base table.
    #[arg(long, default_value_t = 1.0)]
    mortality_multiplier: f64,

    /// Lapse multiplier applied to the base table.
    #[arg(long, default_value_t = 1.0)]
    lapse_multiplier: f64,

    /// Expense multiplier applied to the base assumptions.
    #[arg(long, default_value_t = 1.0)]
    expense_multiplier: f64,

    /// Emit per-year cash-flow traces (memory-heavy for large runs).
    #[arg(long, default_value_t = false)]
    detailed: bool,
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let policies = load_policies(&cli.policies)
        .with_context(|| format!("loading policies from {}", cli.policies.display()))?;
    let assumptions = Assumptions::from_csv_path(&cli.assumptions)
        .with_context(|| format!("loading assumptions from {}", cli.assumptions.display()))?;

    let gbm_params = GbmParams {
        initial_rate: cli.initial_rate,
        drift: cli.drift,
        volatility: cli.volatility,
        min: cli.rate_min,
        max: cli.rate_max,
    };
    let scenarios = match ScenarioGenerator::generate(cli.scenarios, gbm_params, cli.seed) {
        Ok(s) => s,
        Err(LiveCalcError::InvalidParameters(msg)) => {
            log::error!("invalid scenario parameters: {msg}");
            return Ok(1);
        }
        Err(err) => return Err(err.into()),
    };

    let config = ValuationConfig {
        multipliers: AssumptionMultipliers {
            mortality: cli.mortality_multiplier,
            lapse: cli.lapse_multiplier,
            expense: cli.expense_multiplier,
        },
        detailed_output: cli.detailed,
    };

    let result = match valuation::run(&policies, &assumptions, &scenarios, None, &config, None) {
        Ok(r) => r,
        Err(err) => {
            log::error!("valuation run failed: {err}");
            return Ok(2);
        }
    };

    let json = serde_json::to_string_pretty(&result).context("serializing valuation result")?;
    println!("{json}");
    Ok(0)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(0) => ExitCode::from(0),
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}
