//! Per-year cash-flow trace and the result of projecting a single policy
//! under a single scenario.

use serde::{Deserialize, Serialize};

/// One year's worth of cash-flow detail for a (policy, scenario) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyCashFlow {
    pub year: u32,
    pub lives_in_force: f64,
    pub premium: f64,
    pub death_benefit: f64,
    pub surrender_benefit: f64,
    pub expenses: f64,
    pub net_cash_flow: f64,
    pub cumulative_discount_factor: f64,
    pub discounted_cash_flow: f64,
}

/// NPV and bookkeeping for one (policy, scenario) projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub policy_id: u64,
    pub scenario_index: usize,
    pub npv: f64,
    /// Present only when the caller requested a detailed trace.
    pub trace: Option<Vec<YearlyCashFlow>>,
    pub udf_calls: u64,
    pub udf_time: std::time::Duration,
}
