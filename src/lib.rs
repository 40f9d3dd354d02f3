//! Nested-stochastic actuarial valuation engine.
//!
//! Projects a portfolio of policies across a set of stochastic economic
//! scenarios and summarizes the resulting net-present-value distribution.
//! Provides:
//! - Policy and assumption data models (mortality, lapse, expenses)
//! - A deterministic scenario generator (GBM interest-rate paths)
//! - A per-(policy, scenario) cashflow projection engine with pluggable
//!   user-defined decrement adjustments
//! - A parallel valuation driver and summary statistics
//! - An assumption-resolver contract for versioned external tables
//! - An orchestration substrate for wiring independent compute stages

pub mod codec;
pub mod error;
pub mod policy;
pub mod assumptions;
pub mod scenario;
pub mod projection;
pub mod udf;
pub mod valuation;
pub mod resolver;
pub mod orchestration;

pub use codec::{
    deserialize_expense_assumptions, deserialize_lapse_table, deserialize_mortality_table,
    deserialize_policies, deserialize_scenario_set, serialize_expense_assumptions,
    serialize_lapse_table, serialize_mortality_table, serialize_policies, serialize_scenario_set,
};
pub use error::{LiveCalcError, LiveCalcResult, ResolutionFailureKind};
pub use policy::{Gender, Policy, ProductType, UnderwritingClass};
pub use assumptions::{AssumptionMultipliers, Assumptions};
pub use scenario::{GbmParams, Scenario, ScenarioGenerator, ScenarioSet};
pub use projection::{project_policy, ProjectionConfig, ProjectionResult, YearlyCashFlow};
pub use udf::{LapseAdjustment, MortalityAdjustment, UdfHost, UdfMetrics};
pub use valuation::{run as run_valuation, CancellationToken, Percentiles, ValuationConfig, ValuationResult};
pub use resolver::{AssumptionResolver, LocalResolver, ResolvedTable, Version};
