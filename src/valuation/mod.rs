//! Valuation driver: iterates scenarios x policies, parallelizes the
//! policy loop, and aggregates per-scenario portfolio NPVs into summary
//! statistics.

mod stats;

pub use stats::Percentiles;

use crate::assumptions::{AssumptionMultipliers, Assumptions};
use crate::error::LiveCalcResult;
use crate::policy::Policy;
use crate::projection::{project_policy, ProjectionConfig};
use crate::scenario::ScenarioSet;
use crate::udf::UdfHost;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation signal, polled between scenarios.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValuationConfig {
    pub multipliers: AssumptionMultipliers,
    pub detailed_output: bool,
}

/// The result of a complete valuation run, matching the external JSON
/// contract field-for-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    pub mean_npv: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
    pub cte_95: f64,
    pub scenario_npvs: Vec<f64>,
    pub execution_time_ms: u64,
    pub scenarios_failed: usize,
    pub cancelled: bool,
}

/// Runs a full valuation: every policy under every scenario, aggregated
/// into portfolio-level statistics.
///
/// The outer loop over scenarios is sequential; the inner loop over
/// policies runs on the rayon global pool. Reduction is deterministic
/// regardless of thread count: `par_iter().map(...).collect()` preserves
/// original policy-index order, and the per-scenario total is then folded
/// sequentially over that ordered vector.
pub fn run(
    policies: &[Policy],
    assumptions: &Assumptions,
    scenarios: &ScenarioSet,
    udf: Option<&UdfHost>,
    config: &ValuationConfig,
    cancellation: Option<&CancellationToken>,
) -> LiveCalcResult<ValuationResult> {
    let start = Instant::now();
    let proj_config = ProjectionConfig {
        multipliers: config.multipliers,
        detailed_output: config.detailed_output,
    };

    let mut scenario_npvs = Vec::with_capacity(scenarios.len());
    let mut scenario_ok = Vec::with_capacity(scenarios.len());
    let mut scenarios_failed = 0usize;
    let mut cancelled = false;

    for (scenario_index, scenario) in scenarios.iter().enumerate() {
        if let Some(token) = cancellation {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }
        }

        let per_policy: Vec<LiveCalcResult<f64>> = policies
            .par_iter()
            .map(|policy| {
                project_policy(
                    policy,
                    scenario_index,
                    scenario,
                    assumptions,
                    udf,
                    &proj_config,
                )
                .map(|r| r.npv)
            })
            .collect();

        let mut failed = false;
        let mut npv_sum = 0.0;
        for (policy, result) in policies.iter().zip(per_policy.iter()) {
            match result {
                Ok(npv) => npv_sum += npv,
                Err(err) => {
                    log::warn!(
                        "projection failed for policy {} under scenario {}: {}",
                        policy.policy_id,
                        scenario_index,
                        err
                    );
                    failed = true;
                }
            }
        }

        if failed {
            scenarios_failed += 1;
            scenario_npvs.push(0.0);
            scenario_ok.push(false);
        } else {
            scenario_npvs.push(npv_sum);
            scenario_ok.push(true);
        }
    }

    // Failed scenarios are excluded from the statistics input entirely,
    // per the spec's failure-isolation rule; their reported NPV stays 0.
    let valid_npvs: Vec<f64> = scenario_npvs
        .iter()
        .zip(scenario_ok.iter())
        .filter(|(_, ok)| **ok)
        .map(|(v, _)| *v)
        .collect();

    let (mean_npv, std_dev, percentiles, cte_95) = stats::summarize(&valid_npvs);

    Ok(ValuationResult {
        mean_npv,
        std_dev,
        percentiles,
        cte_95,
        scenario_npvs,
        execution_time_ms: start.elapsed().as_millis() as u64,
        scenarios_failed,
        cancelled,
    })
}
